// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the adapters named in configuration and injects them into a
//! [`ToolManager`].

use std::sync::Arc;

use toolforge_config::{ForgeConfig, ProviderConfig, ProviderKind};
use toolforge_core::{ForgeError, ProviderAdapter, ToolRuntimeAdapter, ToolStoreAdapter};
use toolforge_lifecycle::{LifecycleSettings, ToolManager};
use toolforge_sandbox::PythonRuntime;
use toolforge_storage::{Database, ToolStore};
use tracing::info;

/// Chat provider for `provider.kind`.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>, ForgeError> {
    match config.kind {
        #[cfg(feature = "ollama")]
        ProviderKind::Ollama => Ok(Arc::new(toolforge_ollama::OllamaProvider::new(config)?)),
        #[cfg(feature = "openai")]
        ProviderKind::Openai | ProviderKind::Vllm | ProviderKind::GenericOpenai => {
            Ok(Arc::new(toolforge_openai::OpenAiProvider::new(config)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(ForgeError::Config(format!(
            "provider.kind = \"{other}\" is not available in this build"
        ))),
    }
}

pub async fn build_store(config: &ForgeConfig) -> Result<Arc<dyn ToolStoreAdapter>, ForgeError> {
    let embedder = toolforge_embedding::from_config(&config.embedding)?;
    let db = Database::open(&config.storage).await?;
    Ok(Arc::new(ToolStore::new(db, embedder)))
}

pub fn build_runtime(config: &ForgeConfig) -> Result<Arc<dyn ToolRuntimeAdapter>, ForgeError> {
    Ok(Arc::new(PythonRuntime::new(&config.runtime)?))
}

pub async fn build_manager(config: &ForgeConfig) -> Result<ToolManager, ForgeError> {
    let provider = build_provider(&config.provider)?;
    let store = build_store(config).await?;
    let runtime = build_runtime(config)?;
    info!(
        provider = provider.name(),
        store = store.name(),
        runtime = runtime.name(),
        "tool manager ready"
    );
    Ok(ToolManager::new(
        provider,
        store,
        runtime,
        LifecycleSettings::from_config(config),
    ))
}
