// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime double that never starts an interpreter.
//!
//! Outcomes are chosen in this order: the first rule whose needle occurs in
//! the code, then the next queued outcome, then the fallback.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use toolforge_core::{
    AdapterType, ExecutionOutcome, ForgeError, HealthStatus, Invocation, PluginAdapter,
    SyntaxCheck, ToolRuntimeAdapter,
};

/// One recorded `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeCall {
    pub code: String,
    pub entry: String,
    pub invocation: Invocation,
}

pub struct ScriptedRuntime {
    rules: Vec<(String, ExecutionOutcome)>,
    queue: Arc<Mutex<VecDeque<ExecutionOutcome>>>,
    fallback: ExecutionOutcome,
    reject_marker: Option<String>,
    checker_down: bool,
    calls: Arc<Mutex<Vec<RuntimeCall>>>,
    shut_down: Arc<AtomicBool>,
}

impl ScriptedRuntime {
    /// Every run succeeds with a `null` result.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback: ExecutionOutcome::success(Value::Null, None),
            reject_marker: None,
            checker_down: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Code containing `needle` always produces `outcome`.
    pub fn with_rule(mut self, needle: impl Into<String>, outcome: ExecutionOutcome) -> Self {
        self.rules.push((needle.into(), outcome));
        self
    }

    pub fn with_outcomes(self, outcomes: Vec<ExecutionOutcome>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(outcomes.into())),
            ..self
        }
    }

    pub fn with_fallback(mut self, outcome: ExecutionOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// `check_syntax` reports code containing `marker` as invalid.
    pub fn rejecting_code_containing(mut self, marker: impl Into<String>) -> Self {
        self.reject_marker = Some(marker.into());
        self
    }

    /// `check_syntax` fails as if no interpreter were installed.
    pub fn with_checker_unavailable(mut self) -> Self {
        self.checker_down = true;
        self
    }

    pub async fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted-runtime"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Runtime
    }

    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ToolRuntimeAdapter for ScriptedRuntime {
    async fn execute(&self, code: &str, entry: &str, invocation: &Invocation) -> ExecutionOutcome {
        self.calls.lock().await.push(RuntimeCall {
            code: code.to_string(),
            entry: entry.to_string(),
            invocation: invocation.clone(),
        });
        if let Some((_, outcome)) = self.rules.iter().find(|(needle, _)| code.contains(needle)) {
            return outcome.clone();
        }
        match self.queue.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => self.fallback.clone(),
        }
    }

    async fn check_syntax(&self, code: &str) -> Result<SyntaxCheck, ForgeError> {
        if self.checker_down {
            return Err(ForgeError::Runtime {
                message: "no interpreter".into(),
                source: None,
            });
        }
        match &self.reject_marker {
            Some(marker) if code.contains(marker.as_str()) => Ok(SyntaxCheck::Invalid(
                "SyntaxError: invalid syntax (<tool>, line 1)".into(),
            )),
            _ => Ok(SyntaxCheck::Valid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rules_win_over_queue_and_fallback() {
        let runtime = ScriptedRuntime::new()
            .with_rule("boom", ExecutionOutcome::failure("Exception:\nboom"))
            .with_outcomes(vec![ExecutionOutcome::success(json!(1), None)])
            .with_fallback(ExecutionOutcome::success(json!(2), None));
        let inv = Invocation::default();

        assert!(!runtime.execute("boom()", "f", &inv).await.is_success());
        assert_eq!(runtime.execute("ok", "f", &inv).await.result, Some(json!(1)));
        assert_eq!(runtime.execute("ok", "f", &inv).await.result, Some(json!(2)));
        assert_eq!(runtime.call_count().await, 3);
    }

    #[tokio::test]
    async fn syntax_marker_and_checker_outage() {
        let runtime = ScriptedRuntime::new().rejecting_code_containing("def (");
        assert_eq!(runtime.check_syntax("def f(): pass").await.unwrap(), SyntaxCheck::Valid);
        assert!(matches!(
            runtime.check_syntax("def (").await.unwrap(),
            SyntaxCheck::Invalid(_)
        ));
        assert!(
            ScriptedRuntime::new()
                .with_checker_unavailable()
                .check_syntax("x")
                .await
                .is_err()
        );
    }
}
