// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle failures.

use thiserror::Error;
use toolforge_core::ForgeError;

/// Why a creation, revision or rewrite proposal did not produce a result.
///
/// None of these are fatal to the process. Callers either report them or,
/// inside the execution loop, fold them into the failure report.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Tool '{0}' not found in storage.")]
    ToolNotFound(String),

    /// The provider call failed or returned no text.
    #[error("no response from the language model")]
    NoResponse,

    #[error("could not parse the model response into a tool proposal")]
    Unparseable,

    #[error("tool proposal is missing required fields: {0}")]
    MissingFields(String),

    #[error("tool proposal contains no code")]
    MissingCode,

    #[error("generated code failed validation: {0}")]
    InvalidSyntax(String),

    #[error("unknown component '{name}' (known components: {known})")]
    UnknownComponent { name: String, known: String },

    #[error("tool store failure: {0}")]
    Storage(#[from] ForgeError),
}
