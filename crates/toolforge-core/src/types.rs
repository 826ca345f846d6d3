// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the toolforge workspace.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// Health status reported by an adapter's health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Embedding,
    ToolStore,
    Runtime,
}

// --- Tool records ---

/// Derives the storage id for a tool name.
///
/// The id is the first 16 hex characters of the SHA-256 digest of the name,
/// so a name always maps to the same id and re-saving a name overwrites.
pub fn tool_id(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(16);
    id
}

/// Parameter descriptors keyed by parameter name.
pub type ParameterMap = BTreeMap<String, ParamSpec>;

/// A loosely-typed parameter descriptor as produced by a language model.
///
/// Known keys are lifted into fields; anything else is kept verbatim in
/// `extra` so it survives a store round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParamSpec {
    /// Builds a descriptor from any JSON value.
    ///
    /// Objects are split into known and extra keys. A bare string becomes
    /// the description. Other values are kept under `extra["value"]`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let description = take_string(&mut map, "description");
                let kind = take_string(&mut map, "type");
                let required = match map.remove("required") {
                    Some(Value::Bool(flag)) => flag,
                    Some(Value::String(text)) => matches!(
                        text.trim().to_ascii_lowercase().as_str(),
                        "true" | "yes" | "required"
                    ),
                    Some(other) => {
                        map.insert("required".into(), other);
                        false
                    }
                    None => false,
                };
                ParamSpec {
                    description,
                    kind,
                    required,
                    extra: map,
                }
            }
            Value::String(text) => ParamSpec {
                description: Some(text),
                ..Default::default()
            },
            Value::Null => ParamSpec::default(),
            other => {
                let mut extra = Map::new();
                extra.insert("value".into(), other);
                ParamSpec {
                    extra,
                    ..Default::default()
                }
            }
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(text)) => Some(text),
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

impl<'de> Deserialize<'de> for ParamSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ParamSpec::from_value)
    }
}

/// Parses a parameter map out of an arbitrary JSON value.
///
/// Returns `None` when the value is not an object.
pub fn parameters_from_value(value: Value) -> Option<ParameterMap> {
    match value {
        Value::Object(map) => Some(
            map.into_iter()
                .map(|(name, spec)| (name, ParamSpec::from_value(spec)))
                .collect(),
        ),
        _ => None,
    }
}

/// A persisted tool: generated Python source plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Derived from `name` via [`tool_id`].
    pub id: String,
    /// Unique tool name; also the Python entry point.
    pub name: String,
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub parameters: ParameterMap,
    /// Starts at 1 and increases by one per accepted revision.
    pub version: u32,
    /// Recent failure reports, oldest first.
    #[serde(default)]
    pub error_log: Vec<String>,
}

impl ToolRecord {
    /// Creates a first-version record with an empty error log.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterMap,
    ) -> Self {
        let name = name.into();
        Self {
            id: tool_id(&name),
            name,
            code: code.into(),
            description: description.into(),
            parameters,
            version: 1,
            error_log: Vec::new(),
        }
    }

    /// Appends a failure report, evicting the oldest entries beyond `cap`.
    pub fn push_error(&mut self, report: impl Into<String>, cap: usize) {
        self.error_log.push(report.into());
        if self.error_log.len() > cap {
            let excess = self.error_log.len() - cap;
            self.error_log.drain(..excess);
        }
    }
}

/// A record returned by a similarity query with its cosine distance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTool {
    pub record: ToolRecord,
    /// `1 - cosine_similarity`; smaller is closer.
    pub distance: f32,
}

// --- Execution ---

/// Arguments passed to a tool's entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Invocation {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    /// An invocation with positional arguments only.
    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }
}

/// The result of running a tool once.
///
/// `error` is `None` exactly when the run succeeded. Empty captures are
/// normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub result: Option<Value>,
    pub stdout: Option<String>,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn success(result: Value, stdout: Option<String>) -> Self {
        Self {
            result: Some(result),
            stdout,
            error: None,
        }
    }

    /// A failed run with nothing captured besides the report.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            result: None,
            stdout: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a syntax check that managed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Valid,
    Invalid(String),
}

// --- Provider types ---

/// A single chat message sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A provider-agnostic completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

/// Text returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

// --- Embedding types ---

/// Texts to embed in one batch.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// One vector per input text, in input order.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn tool_id_is_stable_prefix_of_sha256() {
        let id = tool_id("add_numbers");
        assert_eq!(id.len(), 16);
        assert_eq!(id, tool_id("add_numbers"));
        assert_ne!(id, tool_id("add_numbers2"));
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(tool_id("abc"), "ba7816bf8f01cfea");
    }

    #[test]
    fn new_record_starts_at_version_one() {
        let record = ToolRecord::new("f", "def f(): pass", "does f", ParameterMap::new());
        assert_eq!(record.version, 1);
        assert!(record.error_log.is_empty());
        assert_eq!(record.id, tool_id("f"));
    }

    #[test]
    fn param_spec_lifts_known_keys() {
        let spec = ParamSpec::from_value(json!({
            "type": "integer",
            "description": "first operand",
            "required": true,
            "minimum": 0
        }));
        assert_eq!(spec.kind.as_deref(), Some("integer"));
        assert_eq!(spec.description.as_deref(), Some("first operand"));
        assert!(spec.required);
        assert_eq!(spec.extra.get("minimum"), Some(&json!(0)));
    }

    #[test]
    fn param_spec_accepts_bare_strings_and_odd_values() {
        let spec = ParamSpec::from_value(json!("the input text"));
        assert_eq!(spec.description.as_deref(), Some("the input text"));

        let spec = ParamSpec::from_value(json!({"type": ["string", "null"], "required": "yes"}));
        assert!(spec.kind.is_none());
        assert!(spec.required);
        assert_eq!(spec.extra.get("type"), Some(&json!(["string", "null"])));
    }

    #[test]
    fn param_spec_serializes_back_to_an_object() {
        let spec = ParamSpec::from_value(json!({"type": "string", "format": "email"}));
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, json!({"type": "string", "format": "email"}));
    }

    #[test]
    fn parameters_from_value_rejects_non_objects() {
        assert!(parameters_from_value(json!(["a", "b"])).is_none());
        let params = parameters_from_value(json!({"a": {"type": "int"}})).unwrap();
        assert_eq!(params["a"].kind.as_deref(), Some("int"));
    }

    #[test]
    fn outcome_success_flag_follows_error() {
        assert!(ExecutionOutcome::success(json!(1), None).is_success());
        assert!(!ExecutionOutcome::failure("boom").is_success());
    }

    proptest! {
        #[test]
        fn error_log_keeps_most_recent_entries(
            entries in proptest::collection::vec("[a-z]{1,8}", 0..20),
            cap in 1usize..8,
        ) {
            let mut record = ToolRecord::new("t", "def t(): pass", "t", ParameterMap::new());
            for entry in &entries {
                record.push_error(entry.clone(), cap);
            }
            let expected: Vec<String> = entries
                .iter()
                .skip(entries.len().saturating_sub(cap))
                .cloned()
                .collect();
            prop_assert!(record.error_log.len() <= cap);
            prop_assert_eq!(record.error_log, expected);
        }
    }
}
