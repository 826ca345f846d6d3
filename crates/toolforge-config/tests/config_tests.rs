// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use std::io::Write;

use serial_test::serial;
use toolforge_config::diagnostic::ConfigError;
use toolforge_config::{
    EmbeddingKind, ForgeConfig, ProviderConfig, ProviderKind, load_and_validate_path,
    load_and_validate_str, load_config_from_str,
};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[provider]
kind = "openai"
model = "gpt-4o-mini"
api_key = "sk-test"
max_tokens = 900
temperature = 0.2

[embedding]
kind = "ollama"
model = "nomic-embed-text"
base_url = "http://gpu-box:11434"

[storage]
database_path = "/tmp/tools.db"
wal_mode = false

[runtime]
python_command = "uv run python"

[lifecycle]
find_threshold = 0.4
reuse_threshold = 0.25
max_repair_attempts = 3
max_error_log_entries = 8

[logging]
log_level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.provider.kind, ProviderKind::Openai);
    assert_eq!(config.provider.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(config.provider.max_tokens, 900);
    assert_eq!(config.embedding.kind, EmbeddingKind::Ollama);
    assert_eq!(config.storage.database_path, "/tmp/tools.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.runtime.python_command, "uv run python");
    assert_eq!(config.lifecycle.max_repair_attempts, 3);
    assert_eq!(config.lifecycle.max_error_log_entries, 8);
    assert_eq!(config.logging.log_level, "debug");
}

#[test]
fn empty_toml_yields_documented_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config.provider.kind, ProviderKind::Ollama);
    assert_eq!(config.provider.max_tokens, 1500);
    assert!((config.provider.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.embedding.kind, EmbeddingKind::Hashing);
    assert_eq!(config.embedding.dimensions, 384);
    assert_eq!(config.runtime.python_command, "python3");
    assert!((config.lifecycle.find_threshold - 0.5).abs() < f32::EPSILON);
    assert!((config.lifecycle.reuse_threshold - 0.3).abs() < f32::EPSILON);
    assert!(config.lifecycle.attempt_repair);
    assert_eq!(config.lifecycle.max_repair_attempts, 1);
    assert_eq!(config.lifecycle.max_error_log_entries, 5);
    assert_eq!(config.lifecycle.similar_tools_in_prompt, 2);
    assert_eq!(config.lifecycle.creation_max_tokens, 2000);
    assert_eq!(config.lifecycle.self_repair_max_tokens, 4000);
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = r#"
[lifecycle]
max_repair_atempts = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => Some((key.clone(), suggestion.clone())),
        _ => None,
    });
    assert_eq!(
        suggestion,
        Some((
            "max_repair_atempts".to_string(),
            Some("max_repair_attempts".to_string())
        ))
    );
}

#[test]
fn unknown_provider_kind_is_rejected() {
    let toml = r#"
[provider]
kind = "anthropic"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[lifecycle]
max_repair_attempts = "many"
"#;
    let errors = load_and_validate_str(toml).expect_err("string for integer");
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("max_repair_attempts")),
        "errors: {errors:?}"
    );
}

#[test]
fn out_of_range_values_fail_validation() {
    let toml = r#"
[lifecycle]
reuse_threshold = -0.5
"#;
    let errors = load_and_validate_str(toml).expect_err("negative threshold");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[lifecycle]\nmax_repair_attempts = 2").expect("write config");

    // SAFETY: serialized with every other env-mutating test in this file.
    unsafe { std::env::set_var("TOOLFORGE_LIFECYCLE_MAX_REPAIR_ATTEMPTS", "4") };
    let loaded = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("TOOLFORGE_LIFECYCLE_MAX_REPAIR_ATTEMPTS") };

    let config = loaded.expect("config should load");
    assert_eq!(config.lifecycle.max_repair_attempts, 4);
}

#[test]
#[serial]
fn env_sets_provider_credentials() {
    let file = tempfile::NamedTempFile::new().expect("temp file");

    unsafe { std::env::set_var("TOOLFORGE_PROVIDER_API_KEY", "sk-from-env") };
    let loaded = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("TOOLFORGE_PROVIDER_API_KEY") };

    let config = loaded.expect("config should load");
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-from-env"));
}

#[test]
#[serial]
fn provider_fields_fall_back_to_kind_env_vars() {
    let provider = ProviderConfig {
        kind: ProviderKind::Vllm,
        ..ProviderConfig::default()
    };

    unsafe {
        std::env::set_var("VLLM_BASE_URL", "http://vllm.internal:8000/v1/");
        std::env::set_var("VLLM_MODEL", "mistral-7b");
    }
    let base_url = provider.resolved_base_url();
    let model = provider.resolved_model();
    unsafe {
        std::env::remove_var("VLLM_BASE_URL");
        std::env::remove_var("VLLM_MODEL");
    }

    assert_eq!(base_url.as_deref(), Some("http://vllm.internal:8000/v1"));
    assert_eq!(model, "mistral-7b");
    assert_eq!(provider.resolved_base_url(), None);
    assert_eq!(provider.resolved_model(), "meta-llama/Llama-2-7b-chat-hf");
}

#[test]
#[serial]
fn explicit_provider_fields_win_over_env() {
    let provider = ProviderConfig {
        kind: ProviderKind::Openai,
        api_key: Some("from-config".into()),
        ..ProviderConfig::default()
    };
    unsafe { std::env::set_var("OPENAI_API_KEY", "from-env") };
    let key = provider.resolved_api_key();
    unsafe { std::env::remove_var("OPENAI_API_KEY") };

    assert_eq!(key.as_deref(), Some("from-config"));
    assert_eq!(
        provider.resolved_base_url().as_deref(),
        Some("https://api.openai.com/v1")
    );
}

#[test]
fn defaults_serialize_to_toml() {
    let text = toml::to_string(&ForgeConfig::default()).expect("serialize defaults");
    assert!(text.contains("[lifecycle]"));
    assert!(text.contains("python_command = \"python3\""));
}
