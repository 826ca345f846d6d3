// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure report layout.
//!
//! Reports are stored in tool error logs and pasted into repair prompts, so
//! the labels are part of the persisted format.

pub const STDERR_LABEL: &str = "Captured stderr:\n";
pub const FAULT_LABEL: &str = "Exception:\n";

/// Combines captured stderr and a fault trace into one report.
///
/// Returns `None` only when both are empty. Stderr output alone is still a
/// failure.
pub fn compose_error_report(stderr: &str, fault: Option<&str>) -> Option<String> {
    match (stderr.is_empty(), fault) {
        (false, Some(trace)) => Some(format!("{STDERR_LABEL}{stderr}\n{FAULT_LABEL}{trace}")),
        (true, Some(trace)) => Some(format!("{FAULT_LABEL}{trace}")),
        (false, None) => Some(format!("{STDERR_LABEL}{stderr}")),
        (true, None) => None,
    }
}

/// `None` for empty captures.
pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
