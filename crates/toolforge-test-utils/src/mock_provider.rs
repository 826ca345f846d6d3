// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic tests.
//!
//! `MockProvider` implements `ProviderAdapter` with a FIFO queue of canned
//! replies and records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use toolforge_core::{
    AdapterType, CompletionRequest, CompletionResponse, ForgeError, HealthStatus, PluginAdapter,
    ProviderAdapter,
};

/// One queued provider answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// The call fails with a provider error carrying this message.
    Fail(String),
}

/// A mock provider returning queued replies in order.
///
/// When the queue is empty, a default "mock response" text is returned.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider pre-loaded with text replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(
                responses.into_iter().map(MockReply::Text).collect(),
            )),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .await
            .push_back(MockReply::Text(text.into()));
    }

    pub async fn add_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .await
            .push_back(MockReply::Fail(message.into()));
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Replies not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// The JSON reply a model sends for a creation or revision directive.
pub fn proposal_reply(name: &str, code: &str, description: &str) -> String {
    proposal_reply_with(name, code, description, Value::Null)
}

/// Like [`proposal_reply`], merging the fields of `extra` (an object) into
/// the reply.
pub fn proposal_reply_with(name: &str, code: &str, description: &str, extra: Value) -> String {
    let mut reply = json!({
        "tool_name": name,
        "code": code,
        "description": description,
    });
    if let (Some(target), Value::Object(fields)) = (reply.as_object_mut(), extra) {
        target.extend(fields);
    }
    reply.to_string()
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
impl ProviderAdapter for MockProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ForgeError> {
        self.requests.lock().await.push(request);
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("mock response".to_string()));
        match reply {
            MockReply::Text(content) => Ok(CompletionResponse {
                content,
                model: "mock-model".to_string(),
            }),
            MockReply::Fail(message) => Err(ForgeError::provider(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_core::ChatMessage;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user(text)],
            max_tokens: 10,
            temperature: 0.0,
            json_mode: false,
        }
    }

    #[tokio::test]
    async fn replies_in_order_then_default() {
        let provider = MockProvider::with_responses(vec!["one".into()]);
        provider.add_failure("rate limited").await;

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "one");
        assert!(provider.complete(request("b")).await.is_err());
        assert_eq!(
            provider.complete(request("c")).await.unwrap().content,
            "mock response"
        );

        let seen = provider.requests().await;
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].messages[0].content, "b");
    }

    #[test]
    fn proposal_reply_merges_extra_fields() {
        let reply = proposal_reply_with(
            "f",
            "def f(): pass",
            "does nothing",
            json!({"fix_explanation": "x"}),
        );
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["tool_name"], "f");
        assert_eq!(value["fix_explanation"], "x");
    }
}
