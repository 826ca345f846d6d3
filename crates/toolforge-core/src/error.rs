// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every toolforge adapter.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
///
/// Lifecycle-level failures (unparseable model output, rejected code) have
/// their own enum in `toolforge-lifecycle`; this one covers the boundaries
/// to the outside world.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Language model provider errors (HTTP failure, bad payload, empty choice list).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation errors.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The code runtime itself failed (interpreter missing, spawn failure).
    ///
    /// Faults raised by generated code are never reported through this
    /// variant; they end up in [`crate::types::ExecutionOutcome::error`].
    #[error("runtime error: {message}")]
    Runtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A named entity does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ForgeError {
    /// Shorthand for a storage error carrying only a message.
    pub fn storage(message: impl Into<String>) -> Self {
        ForgeError::Storage {
            source: message.into().into(),
        }
    }

    /// Shorthand for a provider error without an underlying cause.
    pub fn provider(message: impl Into<String>) -> Self {
        ForgeError::Provider {
            message: message.into(),
            source: None,
        }
    }
}
