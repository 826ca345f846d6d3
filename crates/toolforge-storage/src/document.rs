// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The searchable document stored next to each tool.
//!
//! Tool source is read back only from this layout, using the name and
//! description columns to strip the header:
//!
//! ```text
//! Tool Name: {name}
//! Description: {description}
//! Code:
//! {code}
//! ```

/// Separator between the header lines and the source.
pub const CODE_DELIMITER: &str = "Code:\n";

pub fn encode_document(name: &str, description: &str, code: &str) -> String {
    format!("Tool Name: {name}\nDescription: {description}\n{CODE_DELIMITER}{code}")
}

/// Recovers the source from a document written for `name` and
/// `description`.
///
/// The known header is removed exactly, so a description containing
/// [`CODE_DELIMITER`] cannot leak into the code. Documents whose header does
/// not match fall back to everything after the first delimiter, or an empty
/// string when there is none.
pub fn extract_code<'a>(document: &'a str, name: &str, description: &str) -> &'a str {
    let header = encode_document(name, description, "");
    match document.strip_prefix(header.as_str()) {
        Some(code) => code,
        None => document
            .split_once(CODE_DELIMITER)
            .map(|(_, code)| code)
            .unwrap_or(""),
    }
}
