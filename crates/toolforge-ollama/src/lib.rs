// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama provider adapter using the native `/api/chat` endpoint.

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

use crate::client::OllamaClient;
use crate::types::{OllamaChatRequest, OllamaOptions};

/// Chat provider talking to an Ollama server.
pub struct OllamaProvider {
    client: OllamaClient,
    model: String,
}

impl OllamaProvider {
    /// Base URL resolution: config, `OLLAMA_BASE_URL`, `OLLAMA_HOST`,
    /// then `http://localhost:11434`.
    pub fn new(config: &ProviderConfig) -> Result<Self, ForgeError> {
        if config.kind != ProviderKind::Ollama {
            return Err(ForgeError::Config(format!(
                "OllamaProvider cannot serve provider.kind = \"{}\"",
                config.kind
            )));
        }
        let base_url = config
            .resolved_base_url()
            .ok_or_else(|| ForgeError::Config("no Ollama base URL".into()))?;
        let client = OllamaClient::new(&base_url, Duration::from_secs(config.timeout_secs))?;
        let model = config.resolved_model();
        info!(model = %model, base_url = client.base_url(), "Ollama provider initialized");
        Ok(Self { client, model })
    }

    pub fn with_client(mut self, client: OllamaClient) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    /// Healthy when the server answers and has the configured model pulled.
    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        match self.client.tags().await {
            Ok(tags) => {
                let pulled = tags
                    .iter()
                    .any(|t| t == &self.model || t.split(':').next() == Some(self.model.as_str()));
                if pulled {
                    Ok(HealthStatus::Healthy)
                } else {
                    Ok(HealthStatus::Degraded(format!(
                        "model `{}` is not pulled (try `ollama pull {}`)",
                        self.model, self.model
                    )))
                }
            }
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ForgeError> {
        let json_mode = request.json_mode;
        let wire = OllamaChatRequest {
            model: self.model.clone(),
            messages: request.messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            format: json_mode.then(|| "json".to_string()),
        };

        let response = self.client.chat(&wire).await?;
        if !response.done {
            warn!(model = %self.model, "Ollama reported an unfinished response");
        }
        let content = response.message.content;
        if json_mode && serde_json::from_str::<serde_json::Value>(&content).is_err() {
            warn!(model = %self.model, "JSON output was requested but the reply is not valid JSON");
        }
        debug!(chars = content.len(), eval_count = ?response.eval_count, "Ollama completion received");

        Ok(CompletionResponse {
            content,
            model: response.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(uri: &str) -> OllamaProvider {
        let config = ProviderConfig {
            kind: ProviderKind::Ollama,
            model: Some("llama3".into()),
            base_url: Some(uri.to_string()),
            ..ProviderConfig::default()
        };
        let client = OllamaClient::new(uri, Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10));
        OllamaProvider::new(&config).unwrap().with_client(client)
    }

    #[tokio::test]
    async fn complete_sends_options_and_json_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": false,
                "format": "json",
                "options": {"num_predict": 1500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": "{\"tool_name\": \"x\"}"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = provider(&server.uri())
            .complete(CompletionRequest {
                messages: vec![ChatMessage::user("make a tool")],
                max_tokens: 1500,
                temperature: 0.7,
                json_mode: true,
            })
            .await
            .unwrap();
        assert_eq!(resp.content, "{\"tool_name\": \"x\"}");
    }

    #[tokio::test]
    async fn error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model 'llama3' not found"})),
            )
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .complete(CompletionRequest {
                messages: vec![ChatMessage::user("x")],
                max_tokens: 10,
                temperature: 0.0,
                json_mode: false,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[tokio::test]
    async fn health_reports_missing_model_as_degraded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "mistral:latest"}]
            })))
            .mount(&server)
            .await;

        let status = provider(&server.uri()).health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Degraded(_)), "got {status:?}");
    }

    #[tokio::test]
    async fn health_accepts_tagged_model_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "llama3:latest"}]
            })))
            .mount(&server)
            .await;

        let status = provider(&server.uri()).health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[test]
    fn non_ollama_kind_is_rejected() {
        let config = ProviderConfig {
            kind: ProviderKind::Openai,
            ..ProviderConfig::default()
        };
        assert!(OllamaProvider::new(&config).is_err());
    }
}
