// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use toolforge_config::ForgeConfig;

/// Policy knobs for [`ToolManager`](crate::ToolManager), flattened from the
/// `[lifecycle]` and `[provider]` config sections.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleSettings {
    /// Distance ceiling for a plain `find`.
    pub find_threshold: f32,
    /// Distance ceiling when `use_or_create` decides to reuse a tool.
    pub reuse_threshold: f32,
    pub attempt_repair: bool,
    pub max_repair_attempts: u32,
    pub max_error_log_entries: usize,
    pub similar_tools_in_prompt: usize,
    /// Token budget for repair and improvement replies.
    pub max_tokens: u32,
    pub temperature: f32,
    pub creation_max_tokens: u32,
    pub self_repair_max_tokens: u32,
    pub self_repair_temperature: f32,
}

impl LifecycleSettings {
    pub fn from_config(config: &ForgeConfig) -> Self {
        let lifecycle = &config.lifecycle;
        Self {
            find_threshold: lifecycle.find_threshold,
            reuse_threshold: lifecycle.reuse_threshold,
            attempt_repair: lifecycle.attempt_repair,
            max_repair_attempts: lifecycle.max_repair_attempts,
            max_error_log_entries: lifecycle.max_error_log_entries,
            similar_tools_in_prompt: lifecycle.similar_tools_in_prompt,
            max_tokens: config.provider.max_tokens,
            temperature: config.provider.temperature,
            creation_max_tokens: lifecycle.creation_max_tokens,
            self_repair_max_tokens: lifecycle.self_repair_max_tokens,
            self_repair_temperature: lifecycle.self_repair_temperature,
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from_config(&ForgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config_defaults() {
        let settings = LifecycleSettings::default();
        assert_eq!(settings.find_threshold, 0.5);
        assert_eq!(settings.reuse_threshold, 0.3);
        assert!(settings.attempt_repair);
        assert_eq!(settings.max_repair_attempts, 1);
        assert_eq!(settings.max_error_log_entries, 5);
        assert_eq!(settings.creation_max_tokens, 2000);
        assert_eq!(settings.self_repair_max_tokens, 4000);
    }

    #[test]
    fn provider_section_feeds_revision_budget() {
        let mut config = ForgeConfig::default();
        config.provider.max_tokens = 900;
        config.provider.temperature = 0.1;
        let settings = LifecycleSettings::from_config(&config);
        assert_eq!(settings.max_tokens, 900);
        assert_eq!(settings.temperature, 0.1);
    }
}
