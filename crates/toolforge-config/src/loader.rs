// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./toolforge.toml` > `~/.config/toolforge/toolforge.toml` >
//! `/etc/toolforge/toolforge.toml`, with `TOOLFORGE_*` environment variables
//! on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ForgeConfig;

/// Top-level sections that env var names are split on.
const SECTIONS: &[&str] = &[
    "provider",
    "embedding",
    "storage",
    "runtime",
    "lifecycle",
    "logging",
];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/toolforge/toolforge.toml";
pub(crate) const LOCAL_CONFIG: &str = "toolforge.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("toolforge/toolforge.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/toolforge/toolforge.toml`
/// 3. `~/.config/toolforge/toolforge.toml`
/// 4. `./toolforge.toml`
/// 5. `TOOLFORGE_*` environment variables
pub fn load_config() -> Result<ForgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<ForgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ForgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ForgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ForgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ForgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `TOOLFORGE_<SECTION>_<KEY>` to `section.key`.
///
/// Keys are lowercased and keep their underscores:
/// `TOOLFORGE_LIFECYCLE_MAX_REPAIR_ATTEMPTS` becomes
/// `lifecycle.max_repair_attempts`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("TOOLFORGE_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
