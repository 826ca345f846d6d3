// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Experimental: model-proposed rewrites of this crate's own modules.
//!
//! The sources are embedded at build time. A proposal is checked to parse
//! as a Rust file and handed back to the caller; nothing is written to disk
//! and nothing is compiled or loaded.

use tracing::{info, warn};

use crate::error::LifecycleError;
use crate::manager::{ToolManager, snippet};
use crate::parser::strip_code_fences;
use crate::prompts;

/// Module names accepted by [`ToolManager::propose_component_rewrite`].
pub const COMPONENTS: &[(&str, &str)] = &[
    ("manager", include_str!("manager.rs")),
    ("revision", include_str!("revision.rs")),
    ("parser", include_str!("parser.rs")),
    ("prompts", include_str!("prompts.rs")),
    ("self_repair", include_str!("self_repair.rs")),
];

pub fn component_source(name: &str) -> Option<&'static str> {
    COMPONENTS
        .iter()
        .find(|(component, _)| *component == name)
        .map(|(_, source)| *source)
}

/// A candidate replacement for one module, never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRewrite {
    pub component: String,
    pub current: &'static str,
    pub proposed: String,
}

impl ToolManager {
    /// Asks the model to rewrite `component` so that `issue` goes away.
    pub async fn propose_component_rewrite(
        &self,
        component: &str,
        issue: &str,
    ) -> Result<ComponentRewrite, LifecycleError> {
        let current = component_source(component).ok_or_else(|| {
            LifecycleError::UnknownComponent {
                name: component.to_string(),
                known: COMPONENTS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;
        warn!(component, "requesting a rewrite of library source; the result is advisory only");

        let prompt = prompts::component_rewrite_directive(component, current, issue);
        let reply = self
            .ask(
                prompt,
                self.settings.self_repair_max_tokens,
                self.settings.self_repair_temperature,
                false,
            )
            .await?;

        let proposed = strip_code_fences(&reply);
        if let Err(e) = syn::parse_file(&proposed) {
            warn!(component, error = %e, candidate = %snippet(&proposed, 300), "proposed rewrite does not parse");
            return Err(LifecycleError::InvalidSyntax(e.to_string()));
        }

        info!(component, lines = proposed.lines().count(), "rewrite proposal ready for review");
        Ok(ComponentRewrite {
            component: component.to_string(),
            current,
            proposed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_component_is_embedded_and_parses() {
        for (name, source) in COMPONENTS {
            assert!(!source.is_empty(), "{name} is empty");
            syn::parse_file(source).unwrap_or_else(|e| panic!("{name} does not parse: {e}"));
        }
    }

    #[test]
    fn unknown_component_has_no_source() {
        assert!(component_source("storage").is_none());
        assert!(component_source("parser").is_some());
    }
}
