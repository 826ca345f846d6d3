// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks that run after deserialization succeeded.
//!
//! All problems are collected so the user sees every one of them at once.

use crate::diagnostic::ConfigError;
use crate::model::ForgeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Cosine distance lies in `[0, 2]`.
const MAX_DISTANCE: f32 = 2.0;

/// Validates value ranges and cross-field consistency.
pub fn validate_config(config: &ForgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let lifecycle = &config.lifecycle;
    for (key, value) in [
        ("lifecycle.find_threshold", lifecycle.find_threshold),
        ("lifecycle.reuse_threshold", lifecycle.reuse_threshold),
    ] {
        if !(0.0..=MAX_DISTANCE).contains(&value) {
            fail(format!("{key} must be between 0.0 and 2.0, got {value}"));
        }
    }
    if lifecycle.max_error_log_entries == 0 {
        fail("lifecycle.max_error_log_entries must be at least 1".to_string());
    }
    if lifecycle.creation_max_tokens == 0 || lifecycle.self_repair_max_tokens == 0 {
        fail("lifecycle token limits must be greater than zero".to_string());
    }
    if !(0.0..=2.0).contains(&lifecycle.self_repair_temperature) {
        fail(format!(
            "lifecycle.self_repair_temperature must be between 0.0 and 2.0, got {}",
            lifecycle.self_repair_temperature
        ));
    }

    if config.provider.max_tokens == 0 {
        fail("provider.max_tokens must be greater than zero".to_string());
    }
    if !(0.0..=2.0).contains(&config.provider.temperature) {
        fail(format!(
            "provider.temperature must be between 0.0 and 2.0, got {}",
            config.provider.temperature
        ));
    }
    if config.provider.timeout_secs == 0 {
        fail("provider.timeout_secs must be greater than zero".to_string());
    }

    if config.embedding.dimensions == 0 {
        fail("embedding.dimensions must be greater than zero".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.runtime.python_command.split_whitespace().next().is_none() {
        fail("runtime.python_command must name an interpreter".to_string());
    }

    let level = config.logging.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.log_level `{}` is not one of {}",
            config.logging.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
