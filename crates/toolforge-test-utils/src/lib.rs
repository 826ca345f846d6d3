// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for toolforge integration tests.
//!
//! # Components
//!
//! - [`MockProvider`] - queued model replies, request recording
//! - [`ScriptedRuntime`] - execution outcomes without an interpreter
//! - [`TestHarness`] - both mocks plus a temp SQLite tool store

pub mod harness;
pub mod mock_provider;
pub mod scripted_runtime;

pub use harness::TestHarness;
pub use mock_provider::{MockProvider, MockReply, proposal_reply, proposal_reply_with};
pub use scripted_runtime::{RuntimeCall, ScriptedRuntime};
