// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote embedding endpoints.
//!
//! Supports OpenAI-compatible `POST {base}/embeddings` and Ollama
//! `POST {base}/api/embed`. Returned vectors are L2-normalized.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use toolforge_config::{EmbeddingConfig, EmbeddingKind};
use toolforge_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, ForgeError, HealthStatus,
    PluginAdapter,
};
use tracing::{debug, info};

use crate::l2_normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    OpenAi,
    Ollama,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by an HTTP embedding API.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    flavor: Flavor,
    endpoint: String,
    model: String,
}

fn embedding_err(message: String, source: Option<reqwest::Error>) -> ForgeError {
    ForgeError::Embedding {
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

impl HttpEmbedder {
    /// Builds a client for `config.kind`, which must not be `hashing`.
    ///
    /// The OpenAI flavor needs an API key from config or `OPENAI_API_KEY`.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ForgeError> {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let (flavor, base_url, model) = match config.kind {
            EmbeddingKind::Openai => (
                Flavor::OpenAi,
                config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            ),
            EmbeddingKind::Ollama => (
                Flavor::Ollama,
                config
                    .base_url
                    .clone()
                    .or_else(|| env("OLLAMA_HOST"))
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| "nomic-embed-text".to_string()),
            ),
            EmbeddingKind::Hashing => {
                return Err(ForgeError::Config(
                    "the hashing embedder does not use HTTP".into(),
                ));
            }
        };

        let mut headers = HeaderMap::new();
        let api_key = config.api_key.clone().or_else(|| env("OPENAI_API_KEY"));
        match (flavor, api_key) {
            (Flavor::OpenAi, None) => {
                return Err(ForgeError::Config(
                    "embedding.kind = \"openai\" needs embedding.api_key or OPENAI_API_KEY".into(),
                ));
            }
            (Flavor::OpenAi, Some(key)) => {
                let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    ForgeError::Config(format!("invalid embedding API key header value: {e}"))
                })?;
                headers.insert(AUTHORIZATION, value);
            }
            (Flavor::Ollama, _) => {}
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| embedding_err(format!("failed to build HTTP client: {e}"), Some(e)))?;

        let base = base_url.trim_end_matches('/');
        let endpoint = match flavor {
            Flavor::OpenAi => format!("{base}/embeddings"),
            Flavor::Ollama => format!("{base}/api/embed"),
        };
        info!(endpoint = %endpoint, model = %model, "HTTP embedder initialized");

        Ok(Self {
            client,
            flavor,
            endpoint,
            model,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ForgeError> {
        let body = json!({ "model": self.model, "input": texts });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| embedding_err(format!("embedding request failed: {e}"), Some(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| embedding_err(format!("failed to read embedding response: {e}"), Some(e)))?;
        if !status.is_success() {
            return Err(embedding_err(
                format!("embedding endpoint returned {status}: {text}"),
                None,
            ));
        }

        let parse_err = |e: serde_json::Error| ForgeError::Embedding {
            message: format!("unexpected embedding response: {e}"),
            source: Some(Box::new(e)),
        };
        let vectors = match self.flavor {
            Flavor::OpenAi => {
                let mut parsed: OpenAiEmbeddingResponse =
                    serde_json::from_str(&text).map_err(parse_err)?;
                parsed.data.sort_by_key(|d| d.index);
                parsed.data.into_iter().map(|d| d.embedding).collect()
            }
            Flavor::Ollama => {
                let parsed: OllamaEmbeddingResponse =
                    serde_json::from_str(&text).map_err(parse_err)?;
                parsed.embeddings
            }
        };
        Ok(vectors)
    }
}

#[async_trait]
impl PluginAdapter for HttpEmbedder {
    fn name(&self) -> &str {
        match self.flavor {
            Flavor::OpenAi => "openai-embeddings",
            Flavor::Ollama => "ollama-embeddings",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        match self.request(&["ping".to_string()]).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, ForgeError> {
        let mut embeddings = self.request(&input.texts).await?;
        if embeddings.len() != input.texts.len() {
            return Err(embedding_err(
                format!(
                    "expected {} embeddings, endpoint returned {}",
                    input.texts.len(),
                    embeddings.len()
                ),
                None,
            ));
        }
        embeddings.iter_mut().for_each(|v| l2_normalize(v));
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        debug!(count = embeddings.len(), dimensions, "embeddings received");
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(kind: EmbeddingKind, base_url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            kind,
            base_url: Some(base_url.to_string()),
            api_key: Some("sk-embed".into()),
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn openai_flavor_sorts_by_index_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-embed"))
            .and(body_partial_json(json!({"model": "text-embedding-3-small"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 2.0]},
                    {"index": 0, "embedding": [3.0, 4.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(EmbeddingKind::Openai, &server.uri())).unwrap();
        let out = embedder
            .embed(EmbeddingInput {
                texts: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(out.dimensions, 2);
        assert!((out.embeddings[0][0] - 0.6).abs() < 1e-6);
        assert!((out.embeddings[1][1] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ollama_flavor_reads_embeddings_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0, 0.0, 0.0]]})),
            )
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(EmbeddingKind::Ollama, &server.uri())).unwrap();
        let out = embedder
            .embed(EmbeddingInput {
                texts: vec!["x".into()],
            })
            .await
            .unwrap();
        assert_eq!(out.embeddings, vec![vec![1.0, 0.0, 0.0]]);
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": []})))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(EmbeddingKind::Ollama, &server.uri())).unwrap();
        let err = embedder
            .embed(EmbeddingInput {
                texts: vec!["x".into()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 1 embeddings"));
    }

    #[tokio::test]
    async fn http_failure_marks_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(EmbeddingKind::Ollama, &server.uri())).unwrap();
        match embedder.health_check().await.unwrap() {
            HealthStatus::Unhealthy(msg) => assert!(msg.contains("model not loaded")),
            other => panic!("expected unhealthy, got {other:?}"),
        }
    }

    #[test]
    fn hashing_kind_is_rejected() {
        let cfg = EmbeddingConfig::default();
        assert!(HttpEmbedder::new(&cfg).is_err());
    }
}
