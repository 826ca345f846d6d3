// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use toolforge_core::ForgeError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Chat completions client with a single retry on transient errors
/// (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    /// `api_key` is optional because self-hosted servers often run without
    /// authentication.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ForgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                ForgeError::Config(format!("invalid API key header value: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Shortens the retry delay (for tests against wiremock).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends a non-streaming completion request.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ForgeError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| ForgeError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");
            let body = response.text().await.map_err(|e| ForgeError::Provider {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;

            if status.is_success() {
                return serde_json::from_str(&body).map_err(|e| ForgeError::Provider {
                    message: format!("failed to parse completion response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "API error ({}): {}",
                    api.error.type_.as_deref().unwrap_or("unknown"),
                    api.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(ForgeError::provider(message));
                continue;
            }
            return Err(ForgeError::provider(message));
        }

        Err(last_error
            .unwrap_or_else(|| ForgeError::provider("completion request failed after retries")))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseFormat;
    use toolforge_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(json_mode: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-test".into(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 64,
            temperature: 0.1,
            response_format: json_mode.then(ResponseFormat::json_object),
            stream: false,
        }
    }

    fn client(uri: &str) -> OpenAiClient {
        OpenAiClient::new(uri, Some("sk-test"), Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    fn ok_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "gpt-test",
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
    }

    #[tokio::test]
    async fn sends_bearer_and_json_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"},
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("{}")))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server.uri()).complete(&request(true)).await.unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "slow down", "type": "rate_limit"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("after retry")))
            .mount(&server)
            .await;

        let resp = client(&server.uri()).complete(&request(false)).await.unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("after retry"));
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&request(false))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "bad model", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&request(false))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid_request_error"));
    }
}
