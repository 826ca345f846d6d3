// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level toolforge configuration.
///
/// Every section is optional and defaults to values that work against a
/// local Ollama with the offline hashing embedder.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForgeConfig {
    /// Language model used to write and fix tools.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Embedding backend for similarity search.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Tool database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Python interpreter settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Find/create/repair policy.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Supported chat-completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// api.openai.com; requires an API key.
    Openai,
    /// Native Ollama `/api/chat`.
    Ollama,
    /// A vLLM OpenAI-compatible server; requires a base URL.
    Vllm,
    /// Any other OpenAI-compatible endpoint.
    GenericOpenai,
}

impl ProviderKind {
    /// Prefix for the `{PREFIX}_API_KEY` / `_BASE_URL` / `_MODEL` env vars.
    pub fn env_prefix(self) -> &'static str {
        match self {
            ProviderKind::Openai => "OPENAI",
            ProviderKind::Ollama => "OLLAMA",
            ProviderKind::Vllm => "VLLM",
            ProviderKind::GenericOpenai => "GENERIC_OPENAI",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Openai => "gpt-4-turbo-preview",
            ProviderKind::Ollama => "llama3",
            ProviderKind::Vllm => "meta-llama/Llama-2-7b-chat-hf",
            ProviderKind::GenericOpenai => "default-model",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Openai => "openai",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Vllm => "vllm",
            ProviderKind::GenericOpenai => "generic_openai",
        };
        f.write_str(name)
    }
}

/// Language model provider configuration.
///
/// Unset `api_key`, `base_url` and `model` fall back to the
/// `{KIND}_API_KEY`, `{KIND}_BASE_URL` and `{KIND}_MODEL` environment
/// variables, then to per-kind defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: ProviderKind,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    /// Token limit for repair and improvement requests.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Transport timeout for a single HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            model: None,
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Model name after applying the env fallback and the per-kind default.
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .or_else(|| env_value(self.kind, "MODEL"))
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }

    /// API key from config or `{KIND}_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env_value(self.kind, "API_KEY"))
    }

    /// Base URL from config or `{KIND}_BASE_URL`, without a trailing slash.
    ///
    /// Ollama additionally honours `OLLAMA_HOST`. Kinds with a well-known
    /// endpoint fall back to it; vLLM and generic endpoints have none.
    pub fn resolved_base_url(&self) -> Option<String> {
        let explicit = self
            .base_url
            .clone()
            .or_else(|| env_value(self.kind, "BASE_URL"));
        let url = match self.kind {
            ProviderKind::Openai => {
                explicit.or_else(|| Some("https://api.openai.com/v1".to_string()))
            }
            ProviderKind::Ollama => explicit
                .or_else(|| non_empty_env("OLLAMA_HOST"))
                .or_else(|| Some("http://localhost:11434".to_string())),
            ProviderKind::Vllm | ProviderKind::GenericOpenai => explicit,
        };
        url.map(|u| u.trim_end_matches('/').to_string())
    }
}

fn env_value(kind: ProviderKind, suffix: &str) -> Option<String> {
    non_empty_env(&format!("{}_{suffix}", kind.env_prefix()))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_provider_kind() -> ProviderKind {
    ProviderKind::Ollama
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Embedding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    /// Offline feature hashing; no network, deterministic.
    Hashing,
    /// OpenAI-compatible `/embeddings`.
    Openai,
    /// Ollama `/api/embed`.
    Ollama,
}

/// Embedding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_kind")]
    pub kind: EmbeddingKind,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Vector size for the hashing embedder.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            kind: default_embedding_kind(),
            model: None,
            base_url: None,
            api_key: None,
            dimensions: default_dimensions(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_kind() -> EmbeddingKind {
    EmbeddingKind::Hashing
}

fn default_dimensions() -> usize {
    384
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

/// Tool database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("toolforge").join("tools.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tools.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Python interpreter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Interpreter program, optionally followed by arguments
    /// (for example `"uv run python"`).
    #[serde(default = "default_python_command")]
    pub python_command: String,

    /// Working directory for tool processes. Inherits the caller's when unset.
    #[serde(default)]
    pub working_dir: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            python_command: default_python_command(),
            working_dir: None,
        }
    }
}

fn default_python_command() -> String {
    "python3".to_string()
}

/// Find/create/repair policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Maximum cosine distance accepted by a plain `find`.
    #[serde(default = "default_find_threshold")]
    pub find_threshold: f32,

    /// Maximum cosine distance for reusing a tool in `use_or_create`.
    #[serde(default = "default_reuse_threshold")]
    pub reuse_threshold: f32,

    #[serde(default = "default_attempt_repair")]
    pub attempt_repair: bool,

    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: u32,

    /// Failure reports kept per tool.
    #[serde(default = "default_max_error_log_entries")]
    pub max_error_log_entries: usize,

    /// Similar tools shown to the model when creating a new one.
    #[serde(default = "default_similar_tools_in_prompt")]
    pub similar_tools_in_prompt: usize,

    #[serde(default = "default_creation_max_tokens")]
    pub creation_max_tokens: u32,

    #[serde(default = "default_self_repair_max_tokens")]
    pub self_repair_max_tokens: u32,

    #[serde(default = "default_self_repair_temperature")]
    pub self_repair_temperature: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            find_threshold: default_find_threshold(),
            reuse_threshold: default_reuse_threshold(),
            attempt_repair: default_attempt_repair(),
            max_repair_attempts: default_max_repair_attempts(),
            max_error_log_entries: default_max_error_log_entries(),
            similar_tools_in_prompt: default_similar_tools_in_prompt(),
            creation_max_tokens: default_creation_max_tokens(),
            self_repair_max_tokens: default_self_repair_max_tokens(),
            self_repair_temperature: default_self_repair_temperature(),
        }
    }
}

fn default_find_threshold() -> f32 {
    0.5
}

fn default_reuse_threshold() -> f32 {
    0.3
}

fn default_attempt_repair() -> bool {
    true
}

fn default_max_repair_attempts() -> u32 {
    1
}

fn default_max_error_log_entries() -> usize {
    5
}

fn default_similar_tools_in_prompt() -> usize {
    2
}

fn default_creation_max_tokens() -> u32 {
    2000
}

fn default_self_repair_max_tokens() -> u32 {
    4000
}

fn default_self_repair_temperature() -> f32 {
    0.3
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
