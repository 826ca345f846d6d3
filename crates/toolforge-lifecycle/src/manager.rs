// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool lifecycle orchestrator.
//!
//! [`ToolManager`] decides between reusing a stored tool and asking the
//! model for a new one, runs tools through the runtime, and drives the
//! bounded repair loop when a run fails.

use std::sync::Arc;

use toolforge_core::{
    ChatMessage, CompletionRequest, ExecutionOutcome, Invocation, ProviderAdapter, ScoredTool,
    SyntaxCheck, ToolRecord, ToolRuntimeAdapter, ToolStoreAdapter,
};
use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::parser::{ParseOutcome, parse_proposal};
use crate::prompts;
use crate::revision::{Revision, RevisionRequest};
use crate::settings::LifecycleSettings;

/// First characters of a model reply, for log lines.
pub(crate) fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Orchestrates creation, lookup, execution and revision of tools.
///
/// The collaborators are injected once and shared; the manager holds no
/// per-call state, so one instance can serve concurrent callers. Two
/// concurrent revisions of the same tool are not coordinated and the last
/// upsert wins.
pub struct ToolManager {
    pub(crate) provider: Arc<dyn ProviderAdapter>,
    pub(crate) store: Arc<dyn ToolStoreAdapter>,
    pub(crate) runtime: Arc<dyn ToolRuntimeAdapter>,
    pub(crate) settings: LifecycleSettings,
}

impl ToolManager {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        store: Arc<dyn ToolStoreAdapter>,
        runtime: Arc<dyn ToolRuntimeAdapter>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            provider,
            store,
            runtime,
            settings,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Sends one user message and returns the reply text.
    ///
    /// Provider errors and blank replies both collapse to
    /// [`LifecycleError::NoResponse`].
    pub(crate) async fn ask(
        &self,
        prompt: String,
        max_tokens: u32,
        temperature: f32,
        json_mode: bool,
    ) -> Result<String, LifecycleError> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompt)],
            max_tokens,
            temperature,
            json_mode,
        };
        match self.provider.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                debug!(model = %response.model, chars = response.content.len(), "model replied");
                Ok(response.content)
            }
            Ok(response) => {
                warn!(model = %response.model, "model returned an empty reply");
                Err(LifecycleError::NoResponse)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "model call failed");
                Err(LifecycleError::NoResponse)
            }
        }
    }

    /// Rejects code the runtime cannot compile.
    ///
    /// A checker that cannot run counts as a rejection.
    pub(crate) async fn validate_code(&self, code: &str) -> Result<(), LifecycleError> {
        match self.runtime.check_syntax(code).await {
            Ok(SyntaxCheck::Valid) => Ok(()),
            Ok(SyntaxCheck::Invalid(message)) => {
                warn!(%message, "generated code does not compile");
                Err(LifecycleError::InvalidSyntax(message))
            }
            Err(e) => {
                warn!(error = %e, "syntax check could not run");
                Err(LifecycleError::InvalidSyntax(format!(
                    "syntax check unavailable: {e}"
                )))
            }
        }
    }

    /// Asks the model for a new tool that performs `task` and stores it.
    ///
    /// A tool with the same name as the proposal is overwritten.
    pub async fn create(&self, task: &str) -> Result<ToolRecord, LifecycleError> {
        info!(task = %snippet(task, 100), "creating tool");

        let similar = match self.settings.similar_tools_in_prompt {
            0 => Vec::new(),
            n => self.store.query_similar(task, n).await.unwrap_or_else(|e| {
                warn!(error = %e, "similar-tool lookup failed, creating without context");
                Vec::new()
            }),
        };

        let prompt = prompts::creation_directive(task, &similar);
        let reply = self
            .ask(
                prompt,
                self.settings.creation_max_tokens,
                self.settings.temperature,
                true,
            )
            .await?;

        let proposal = match parse_proposal(&reply) {
            ParseOutcome::Matched(proposal) => proposal,
            ParseOutcome::Mismatch => {
                warn!(reply = %snippet(&reply, 200), "creation reply is not a tool proposal");
                return Err(LifecycleError::Unparseable);
            }
        };
        let blank = proposal.blank_fields();
        if !blank.is_empty() {
            return Err(LifecycleError::MissingFields(blank.join(", ")));
        }
        self.validate_code(&proposal.code).await?;

        match self.store.get(&proposal.tool_name).await {
            Ok(Some(existing)) => warn!(
                tool = %proposal.tool_name,
                replaced_version = existing.version,
                "a tool with this name already exists, overwriting"
            ),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "existing-tool check failed"),
        }

        let record = ToolRecord::new(
            proposal.tool_name,
            proposal.code,
            proposal.description,
            proposal.parameters.unwrap_or_default(),
        );
        self.store.upsert(&record).await?;
        info!(tool = %record.name, "tool created");
        Ok(record)
    }

    /// Returns the closest stored tool if its distance is within `threshold`.
    pub async fn find(&self, description: &str, threshold: f32) -> Option<ScoredTool> {
        let best = match self.store.query_similar(description, 1).await {
            Ok(hits) => hits.into_iter().next()?,
            Err(e) => {
                warn!(error = %e, "similarity lookup failed");
                return None;
            }
        };
        if best.distance <= threshold {
            info!(tool = %best.record.name, distance = best.distance, "found matching tool");
            Some(best)
        } else {
            debug!(
                tool = %best.record.name,
                distance = best.distance,
                threshold,
                "closest tool is not close enough"
            );
            None
        }
    }

    /// Runs a stored tool, repairing and retrying on failure.
    ///
    /// Every failure is appended to the tool's error log before the repair
    /// decision. At most `max_repair_attempts` repairs are made per call.
    pub async fn execute(
        &self,
        name: &str,
        invocation: &Invocation,
        attempt_repair: bool,
        max_repair_attempts: u32,
    ) -> ExecutionOutcome {
        let mut attempt = 0u32;
        loop {
            let mut record = match self.store.get(name).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    warn!(tool = name, "tool not found");
                    return ExecutionOutcome::failure(format!(
                        "Tool '{name}' not found in storage."
                    ));
                }
                Err(e) => {
                    warn!(tool = name, error = %e, "tool lookup failed");
                    return ExecutionOutcome::failure(format!(
                        "Failed to load tool '{name}': {e}"
                    ));
                }
            };
            if record.code.trim().is_empty() {
                return ExecutionOutcome::failure(format!("Tool '{name}' found but has no code."));
            }

            info!(tool = name, version = record.version, attempt = attempt + 1, "executing tool");
            let outcome = self
                .runtime
                .execute(&record.code, &record.name, invocation)
                .await;
            let Some(error) = outcome.error.clone() else {
                info!(tool = name, version = record.version, "tool run succeeded");
                return outcome;
            };
            warn!(tool = name, version = record.version, "tool run failed");
            debug!(tool = name, report = %error, "failure report");

            record.push_error(error.clone(), self.settings.max_error_log_entries);
            if let Err(e) = self.store.upsert(&record).await {
                warn!(tool = name, error = %e, "could not persist error log");
            }

            if !attempt_repair || attempt >= max_repair_attempts {
                return outcome;
            }

            match self
                .revise(name, RevisionRequest::Repair { error: error.clone() })
                .await
            {
                Ok(revision) => {
                    info!(
                        tool = name,
                        version = revision.record.version,
                        "repaired, retrying"
                    );
                    attempt += 1;
                }
                Err(reason) => {
                    warn!(tool = name, %reason, "repair failed");
                    return ExecutionOutcome {
                        result: None,
                        stdout: outcome.stdout,
                        error: Some(format!(
                            "Original Error:\n{error}\n\nRepair Failed: {reason}"
                        )),
                    };
                }
            }
        }
    }

    /// Fixes a tool from a failure report.
    pub async fn repair(&self, name: &str, error: &str) -> Result<Revision, LifecycleError> {
        self.revise(
            name,
            RevisionRequest::Repair {
                error: error.to_string(),
            },
        )
        .await
    }

    /// Changes a tool as described by `request`. The tool keeps its name.
    pub async fn improve(&self, name: &str, request: &str) -> Result<Revision, LifecycleError> {
        self.revise(
            name,
            RevisionRequest::Improve {
                request: request.to_string(),
            },
        )
        .await
    }

    /// Reuses a close-enough tool for `task` or creates one, then runs it.
    pub async fn use_or_create(
        &self,
        task: &str,
        invocation: &Invocation,
        similarity_threshold: f32,
        attempt_repair: bool,
        max_repair_attempts: u32,
    ) -> ExecutionOutcome {
        let name = match self.find(task, similarity_threshold).await {
            Some(hit) => hit.record.name,
            None => match self.create(task).await {
                Ok(record) => record.name,
                Err(reason) => {
                    warn!(%reason, "tool creation failed");
                    return ExecutionOutcome::failure(format!(
                        "Tool creation failed for the task: {reason}"
                    ));
                }
            },
        };
        self.execute(&name, invocation, attempt_repair, max_repair_attempts)
            .await
    }

    /// [`use_or_create`](Self::use_or_create) with the configured policy.
    pub async fn run(&self, task: &str, invocation: &Invocation) -> ExecutionOutcome {
        self.use_or_create(
            task,
            invocation,
            self.settings.reuse_threshold,
            self.settings.attempt_repair,
            self.settings.max_repair_attempts,
        )
        .await
    }

    pub async fn get(&self, name: &str) -> Result<Option<ToolRecord>, LifecycleError> {
        Ok(self.store.get(name).await?)
    }

    /// Every stored tool, ordered by name.
    pub async fn list(&self) -> Result<Vec<ToolRecord>, LifecycleError> {
        Ok(self.store.get_all().await?)
    }

    /// Returns true if a tool was removed.
    pub async fn delete(&self, name: &str) -> Result<bool, LifecycleError> {
        let removed = self.store.delete(name).await?;
        if removed {
            info!(tool = name, "tool deleted");
        }
        Ok(removed)
    }

    /// Shuts down the store, runtime and provider, in that order. A failing
    /// adapter is logged and does not stop the others.
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.shutdown().await {
            warn!(adapter = self.store.name(), error = %e, "shutdown failed");
        }
        if let Err(e) = self.runtime.shutdown().await {
            warn!(adapter = self.runtime.name(), error = %e, "shutdown failed");
        }
        if let Err(e) = self.provider.shutdown().await {
            warn!(adapter = self.provider.name(), error = %e, "shutdown failed");
        }
        debug!("tool manager shut down");
    }
}
