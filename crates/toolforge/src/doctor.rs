// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `toolforge doctor`: checks that every configured collaborator answers.

use std::time::{Duration, Instant};

use toolforge_config::ForgeConfig;
use toolforge_core::{ForgeError, HealthStatus, PluginAdapter};

use crate::commands::Output;
use crate::wiring;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs all checks and prints one line per check. Warnings do not fail.
pub async fn run_doctor(config: &ForgeConfig, out: &Output) -> bool {
    let results = vec![
        check_config(config),
        check_provider(config).await,
        check_embedder(config).await,
        check_database(config).await,
        check_interpreter(config).await,
    ];

    println!();
    println!("  toolforge doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, out.colored()));
    }
    println!();

    let failures = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warnings = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();
    match failures + warnings {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();
    failures == 0
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let ms = result.duration.as_millis();
    let (symbol, message) = match (&result.status, use_color) {
        (CheckStatus::Pass, true) => ("✓".green().to_string(), result.message.normal()),
        (CheckStatus::Warn, true) => ("!".yellow().to_string(), result.message.yellow()),
        (CheckStatus::Fail, true) => ("✗".red().to_string(), result.message.red()),
        (CheckStatus::Pass, false) => ("[OK]  ".to_string(), result.message.normal()),
        (CheckStatus::Warn, false) => ("[WARN]".to_string(), result.message.normal()),
        (CheckStatus::Fail, false) => ("[FAIL]".to_string(), result.message.normal()),
    };
    if use_color {
        format!("    {symbol} {:<14} {message} ({ms}ms)", result.name)
    } else {
        format!("    {symbol} {:<14} {} ({ms}ms)", result.name, result.message)
    }
}

fn check_config(config: &ForgeConfig) -> CheckResult {
    let start = Instant::now();
    let model = config
        .provider
        .model
        .clone()
        .unwrap_or_else(|| config.provider.kind.default_model().to_string());
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!("provider {} ({model})", config.provider.kind),
        start,
    )
}

async fn check_adapter<A>(
    name: &str,
    built: Result<A, ForgeError>,
    start: Instant,
) -> CheckResult
where
    A: std::ops::Deref,
    A::Target: PluginAdapter,
{
    let adapter = match built {
        Ok(adapter) => adapter,
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    };
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => {
            CheckResult::new(name, CheckStatus::Pass, adapter.name().to_string(), start)
        }
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new(name, CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new(name, CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_provider(config: &ForgeConfig) -> CheckResult {
    let start = Instant::now();
    check_adapter("Model", wiring::build_provider(&config.provider), start).await
}

async fn check_embedder(config: &ForgeConfig) -> CheckResult {
    let start = Instant::now();
    check_adapter(
        "Embeddings",
        toolforge_embedding::from_config(&config.embedding),
        start,
    )
    .await
}

/// A missing database file is a warning; it is created on first use.
async fn check_database(config: &ForgeConfig) -> CheckResult {
    let start = Instant::now();
    let path = &config.storage.database_path;
    if !std::path::Path::new(path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {path} (will be created on first run)"),
            start,
        );
    }
    check_adapter("Database", wiring::build_store(config).await, start).await
}

async fn check_interpreter(config: &ForgeConfig) -> CheckResult {
    let start = Instant::now();
    check_adapter("Python", wiring::build_runtime(config), start).await
}
