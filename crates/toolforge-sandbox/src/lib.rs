// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution harness for generated Python tools.
//!
//! Each call runs in its own interpreter process with a clean namespace.
//! Output on stdout and stderr is captured, and faults from generated code
//! come back as an [`ExecutionOutcome`](toolforge_core::ExecutionOutcome)
//! error report instead of an `Err`.
//!
//! The harness provides no sandboxing in the security sense.

pub mod python;
pub mod report;

pub use python::PythonRuntime;
pub use report::{FAULT_LABEL, STDERR_LABEL, compose_error_report};
