// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter.
//!
//! One adapter serves three provider kinds that speak the same
//! `/chat/completions` protocol: `openai`, `vllm` and `generic_openai`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use toolforge_config::{ProviderConfig, ProviderKind};
use toolforge_core::{
    AdapterType, CompletionRequest, CompletionResponse, ForgeError, HealthStatus, PluginAdapter,
    ProviderAdapter,
};
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;
use crate::types::{ChatCompletionRequest, ResponseFormat};

/// Chat provider for OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    client: OpenAiClient,
    kind: ProviderKind,
    model: String,
}

impl OpenAiProvider {
    /// Builds the provider, failing fast on missing credentials.
    ///
    /// - `openai` needs an API key (config or `OPENAI_API_KEY`).
    /// - `vllm` and `generic_openai` need a base URL (config or
    ///   `{KIND}_BASE_URL`); their API key is optional.
    pub fn new(config: &ProviderConfig) -> Result<Self, ForgeError> {
        if config.kind == ProviderKind::Ollama {
            return Err(ForgeError::Config(
                "the ollama provider kind is served by toolforge-ollama".into(),
            ));
        }

        let api_key = config.resolved_api_key();
        if config.kind == ProviderKind::Openai && api_key.is_none() {
            return Err(ForgeError::Config(
                "provider.kind = \"openai\" requires provider.api_key or OPENAI_API_KEY".into(),
            ));
        }

        let base_url = config.resolved_base_url().ok_or_else(|| {
            ForgeError::Config(format!(
                "provider.kind = \"{}\" requires provider.base_url or {}_BASE_URL",
                config.kind,
                config.kind.env_prefix()
            ))
        })?;

        let client = OpenAiClient::new(
            &base_url,
            api_key.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?;
        let model = config.resolved_model();
        info!(kind = %config.kind, model = %model, endpoint = client.endpoint(), "provider initialized");

        Ok(Self {
            client,
            kind: config.kind,
            model,
        })
    }

    /// Replaces the HTTP client (tests use a short retry delay).
    pub fn with_client(mut self, client: OpenAiClient) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_wire(&self, request: CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then(ResponseFormat::json_object),
            stream: false,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::Vllm => "vllm",
            ProviderKind::GenericOpenai => "generic_openai",
            _ => "openai",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ForgeError> {
        let wire = self.to_wire(request);
        let response = self.client.complete(&wire).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ForgeError::provider("completion returned no choices"))?;
        if choice.finish_reason.as_deref() == Some("length") {
            warn!(model = %self.model, "completion truncated at max_tokens");
        }
        let content = choice
            .message
            .content
            .ok_or_else(|| ForgeError::provider("completion choice has no content"))?;

        debug!(chars = content.len(), "completion received");
        Ok(CompletionResponse {
            content,
            model: response.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}
