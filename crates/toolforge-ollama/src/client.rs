// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local or remote Ollama server.

use std::time::Duration;

use toolforge_core::ForgeError;
use tracing::{debug, warn};

use crate::types::{OllamaChatRequest, OllamaChatResponse, OllamaErrorResponse, OllamaTagsResponse};

/// Thin wrapper over `/api/chat` and `/api/tags`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

fn provider_err(message: String, source: reqwest::Error) -> ForgeError {
    ForgeError::Provider {
        message,
        source: Some(Box::new(source)),
    }
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ForgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| provider_err(format!("failed to build HTTP client: {e}"), e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends a non-streaming chat request. A 503 (model still loading) is
    /// retried once.
    pub async fn chat(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse, ForgeError> {
        let url = format!("{}/api/chat", self.base_url);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Ollama chat request");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| provider_err(format!("Ollama request failed: {e}"), e))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| provider_err(format!("failed to read Ollama response: {e}"), e))?;
            debug!(status = %status, attempt, "Ollama chat response received");

            if status.is_success() {
                return serde_json::from_str(&body).map_err(|e| ForgeError::Provider {
                    message: format!("failed to parse Ollama response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let detail = serde_json::from_str::<OllamaErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            if status.as_u16() == 503 && attempt < self.max_retries {
                warn!(detail = %detail, "Ollama unavailable, will retry");
                continue;
            }
            return Err(ForgeError::provider(format!(
                "Ollama returned {status}: {detail}"
            )));
        }

        Err(ForgeError::provider("Ollama chat failed after retries"))
    }

    /// Lists locally available model tags.
    pub async fn tags(&self) -> Result<Vec<String>, ForgeError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| provider_err(format!("Ollama request failed: {e}"), e))?;
        if !response.status().is_success() {
            return Err(ForgeError::provider(format!(
                "Ollama /api/tags returned {}",
                response.status()
            )));
        }
        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| provider_err(format!("failed to parse Ollama tags: {e}"), e))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
