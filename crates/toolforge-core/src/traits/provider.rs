// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for language model backends.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for a chat-completion language model.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the generated text.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResponse, ForgeError>;
}
