// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool lifecycle for toolforge.
//!
//! [`ToolManager`] finds or creates a tool for a task, runs it, and repairs
//! it with the model when a run fails. Replies from the model go through
//! [`parser::parse_proposal`]; the directives it receives live in
//! [`prompts`].

pub mod error;
pub mod manager;
pub mod parser;
pub mod prompts;
pub mod revision;
pub mod self_repair;
pub mod settings;

pub use error::LifecycleError;
pub use manager::ToolManager;
pub use parser::{ParseOutcome, Proposal, parse_proposal, strip_code_fences};
pub use revision::{Revision, RevisionRequest};
pub use self_repair::{COMPONENTS, ComponentRewrite};
pub use settings::LifecycleSettings;
