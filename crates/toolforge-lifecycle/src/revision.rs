// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-driven revisions of stored tools.
//!
//! Repairs and improvements share one procedure and differ only in the
//! directive, the error-log handling, and whether a rename is tolerated.
//! A failed revision never touches the stored record.

use toolforge_core::ToolRecord;
use tracing::{info, warn};

use crate::error::LifecycleError;
use crate::manager::{ToolManager, snippet};
use crate::parser::{ParseOutcome, parse_proposal};
use crate::prompts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionRequest {
    /// Fix the failure described by `error`. Clears the error log.
    Repair { error: String },
    /// Apply a requested change. Keeps the error log.
    Improve { request: String },
}

impl RevisionRequest {
    fn label(&self) -> &'static str {
        match self {
            RevisionRequest::Repair { .. } => "repair",
            RevisionRequest::Improve { .. } => "improvement",
        }
    }
}

/// A stored revision and the model's account of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub record: ToolRecord,
    /// `fix_explanation` or `improvement_summary` from the reply.
    pub rationale: Option<String>,
}

impl ToolManager {
    /// Asks the model for a new revision of `name` and stores it.
    ///
    /// The new record keeps the original name and has `version + 1`.
    pub async fn revise(
        &self,
        name: &str,
        request: RevisionRequest,
    ) -> Result<Revision, LifecycleError> {
        let original = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| LifecycleError::ToolNotFound(name.to_string()))?;
        let kind = request.label();
        info!(tool = name, version = original.version, kind, "requesting revision");

        let prompt = match &request {
            RevisionRequest::Repair { error } => prompts::repair_directive(&original, error),
            RevisionRequest::Improve { request } => {
                prompts::improvement_directive(&original, request)
            }
        };
        let reply = self
            .ask(prompt, self.settings.max_tokens, self.settings.temperature, true)
            .await?;

        let proposal = match parse_proposal(&reply) {
            ParseOutcome::Matched(proposal) => proposal,
            ParseOutcome::Mismatch => {
                warn!(tool = name, kind, reply = %snippet(&reply, 200), "revision reply is not a tool proposal");
                return Err(LifecycleError::Unparseable);
            }
        };
        if proposal.code.trim().is_empty() {
            return Err(LifecycleError::MissingCode);
        }
        self.validate_code(&proposal.code).await?;

        if proposal.tool_name != original.name {
            warn!(
                tool = name,
                proposed = %proposal.tool_name,
                kind,
                "model proposed a rename; keeping the original name"
            );
        }

        let description = if proposal.description.trim().is_empty() {
            original.description.clone()
        } else {
            proposal.description
        };
        let (error_log, rationale) = match request {
            RevisionRequest::Repair { .. } => (Vec::new(), proposal.fix_explanation),
            RevisionRequest::Improve { .. } => {
                (original.error_log.clone(), proposal.improvement_summary)
            }
        };
        let record = ToolRecord {
            id: original.id.clone(),
            name: original.name.clone(),
            code: proposal.code,
            description,
            parameters: proposal.parameters.unwrap_or(original.parameters),
            version: original.version + 1,
            error_log,
        };

        self.store.upsert(&record).await?;
        info!(
            tool = name,
            version = record.version,
            kind,
            rationale = rationale.as_deref().unwrap_or("none given"),
            "revision stored"
        );
        Ok(Revision { record, rationale })
    }
}
