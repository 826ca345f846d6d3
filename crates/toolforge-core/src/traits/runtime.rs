// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime adapter trait for executing generated tool code.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ExecutionOutcome, Invocation, SyntaxCheck};

/// Loads generated source into a fresh namespace and calls its entry point.
///
/// Implementations must never let a fault in generated code escape: missing
/// entry points, load-time exceptions and call-time exceptions all become
/// an [`ExecutionOutcome`] with `error` set.
#[async_trait]
pub trait ToolRuntimeAdapter: PluginAdapter {
    /// Runs `entry` from `code` with the given arguments.
    async fn execute(&self, code: &str, entry: &str, invocation: &Invocation)
    -> ExecutionOutcome;

    /// Checks that `code` is syntactically valid without running it.
    ///
    /// An `Err` means the check itself could not run.
    async fn check_syntax(&self, code: &str) -> Result<SyntaxCheck, ForgeError>;
}
