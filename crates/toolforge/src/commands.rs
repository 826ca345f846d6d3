// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand handlers. Each returns `true` on success so `main` can pick
//! the exit code.

use std::io::IsTerminal;

use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value, json};
use toolforge_core::{ExecutionOutcome, Invocation, ToolRecord};
use toolforge_lifecycle::ToolManager;

/// Where and how results are printed.
pub struct Output {
    use_color: bool,
    json: bool,
}

impl Output {
    pub fn new(plain: bool, json: bool) -> Self {
        Self {
            use_color: !plain && std::io::stdout().is_terminal(),
            json,
        }
    }

    pub fn colored(&self) -> bool {
        self.use_color
    }

    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {message}", "error:".red().bold());
        } else {
            eprintln!("error: {message}");
        }
    }

    fn heading(&self, text: &str) {
        if self.use_color {
            println!("{}", text.bold());
        } else {
            println!("{text}");
        }
    }

    fn field(&self, label: &str, value: &str) {
        if self.use_color {
            println!("  {:<12} {value}", label.dimmed());
        } else {
            println!("  {label:<12} {value}");
        }
    }

    fn note(&self, text: &str) {
        if self.use_color {
            println!("{}", text.yellow());
        } else {
            println!("{text}");
        }
    }

    fn emit<T: Serialize>(&self, value: &T) -> bool {
        match serde_json::to_string_pretty(value) {
            Ok(text) => {
                println!("{text}");
                true
            }
            Err(e) => {
                self.error(&format!("could not encode output: {e}"));
                false
            }
        }
    }
}

/// Call arguments as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub args: Option<String>,
    pub kwargs: Option<String>,
    pub repair: bool,
    /// Falls back to `lifecycle.max_repair_attempts`.
    pub max_repairs: Option<u32>,
}

/// `--args` must be a JSON array and `--kwargs` a JSON object.
pub fn parse_invocation(opts: &CallOptions) -> Result<Invocation, String> {
    let args = match opts.args.as_deref() {
        None => Vec::new(),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return Err("--args must be a JSON array".into()),
            Err(e) => return Err(format!("--args is not valid JSON: {e}")),
        },
    };
    let kwargs = match opts.kwargs.as_deref() {
        None => Map::new(),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err("--kwargs must be a JSON object".into()),
            Err(e) => return Err(format!("--kwargs is not valid JSON: {e}")),
        },
    };
    Ok(Invocation::new(args, kwargs))
}

fn print_outcome(out: &Output, outcome: &ExecutionOutcome) -> bool {
    if out.json {
        return out.emit(outcome) && outcome.is_success();
    }
    if let Some(stdout) = &outcome.stdout {
        out.heading("stdout:");
        println!("{}", stdout.trim_end());
    }
    if let Some(result) = &outcome.result {
        out.heading("result:");
        println!("{}", render_value(result));
    }
    match &outcome.error {
        Some(error) => {
            out.error("tool run failed");
            eprintln!("{}", error.trim_end());
            false
        }
        None => true,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn print_summary(out: &Output, record: &ToolRecord) {
    out.heading(&format!("{} (v{})", record.name, record.version));
    out.field("description", &record.description);
    if !record.parameters.is_empty() {
        let names: Vec<&str> = record.parameters.keys().map(String::as_str).collect();
        out.field("parameters", &names.join(", "));
    }
}

pub async fn run(
    manager: &ToolManager,
    out: &Output,
    task: &str,
    opts: &CallOptions,
    threshold: Option<f32>,
) -> bool {
    let invocation = match parse_invocation(opts) {
        Ok(invocation) => invocation,
        Err(e) => {
            out.error(&e);
            return false;
        }
    };
    let settings = manager.settings();
    let outcome = manager
        .use_or_create(
            task,
            &invocation,
            threshold.unwrap_or(settings.reuse_threshold),
            opts.repair && settings.attempt_repair,
            opts.max_repairs.unwrap_or(settings.max_repair_attempts),
        )
        .await;
    print_outcome(out, &outcome)
}

pub async fn create(manager: &ToolManager, out: &Output, task: &str) -> bool {
    match manager.create(task).await {
        Ok(record) if out.json => out.emit(&record),
        Ok(record) => {
            print_summary(out, &record);
            true
        }
        Err(e) => {
            out.error(&format!("could not create a tool: {e}"));
            false
        }
    }
}

pub async fn find(
    manager: &ToolManager,
    out: &Output,
    description: &str,
    threshold: Option<f32>,
) -> bool {
    let threshold = threshold.unwrap_or(manager.settings().find_threshold);
    match manager.find(description, threshold).await {
        Some(hit) if out.json => out.emit(&json!({
            "name": hit.record.name,
            "description": hit.record.description,
            "distance": hit.distance,
        })),
        Some(hit) => {
            print_summary(out, &hit.record);
            out.field("distance", &format!("{:.4}", hit.distance));
            true
        }
        None if out.json => out.emit(&Value::Null),
        None => {
            out.note(&format!("no stored tool within distance {threshold}"));
            true
        }
    }
}

pub async fn exec(manager: &ToolManager, out: &Output, name: &str, opts: &CallOptions) -> bool {
    let invocation = match parse_invocation(opts) {
        Ok(invocation) => invocation,
        Err(e) => {
            out.error(&e);
            return false;
        }
    };
    let settings = manager.settings();
    let outcome = manager
        .execute(
            name,
            &invocation,
            opts.repair && settings.attempt_repair,
            opts.max_repairs.unwrap_or(settings.max_repair_attempts),
        )
        .await;
    print_outcome(out, &outcome)
}

#[derive(Serialize)]
struct RevisionView<'a> {
    tool: &'a ToolRecord,
    summary: Option<&'a str>,
}

pub async fn improve(manager: &ToolManager, out: &Output, name: &str, request: &str) -> bool {
    match manager.improve(name, request).await {
        Ok(revision) if out.json => out.emit(&RevisionView {
            tool: &revision.record,
            summary: revision.rationale.as_deref(),
        }),
        Ok(revision) => {
            print_summary(out, &revision.record);
            if let Some(summary) = &revision.rationale {
                out.field("changes", summary);
            }
            true
        }
        Err(e) => {
            out.error(&format!("could not improve '{name}': {e}"));
            false
        }
    }
}

pub async fn list(manager: &ToolManager, out: &Output) -> bool {
    let tools = match manager.list().await {
        Ok(tools) => tools,
        Err(e) => {
            out.error(&format!("could not list tools: {e}"));
            return false;
        }
    };
    if out.json {
        let rows: Vec<Value> = tools
            .iter()
            .map(|t| json!({"name": t.name, "version": t.version, "description": t.description}))
            .collect();
        return out.emit(&rows);
    }
    if tools.is_empty() {
        out.note("no tools stored yet");
        return true;
    }
    for tool in &tools {
        let label = format!("{:<24} v{:<3}", tool.name, tool.version);
        if out.use_color {
            println!("{} {}", label.bold(), tool.description);
        } else {
            println!("{label} {}", tool.description);
        }
    }
    true
}

pub async fn show(manager: &ToolManager, out: &Output, name: &str) -> bool {
    let record = match manager.get(name).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            out.error(&format!("Tool '{name}' not found in storage."));
            return false;
        }
        Err(e) => {
            out.error(&e.to_string());
            return false;
        }
    };
    if out.json {
        return out.emit(&record);
    }
    print_summary(out, &record);
    out.field("id", &record.id);
    out.field("errors", &record.error_log.len().to_string());
    println!();
    println!("{}", record.code.trim_end());
    if let Some(last) = record.error_log.last() {
        println!();
        out.heading("last error:");
        println!("{}", last.trim_end());
    }
    true
}

pub async fn delete(manager: &ToolManager, out: &Output, name: &str) -> bool {
    match manager.delete(name).await {
        Ok(true) => {
            if out.json {
                return out.emit(&json!({"deleted": name}));
            }
            println!("deleted '{name}'");
            true
        }
        Ok(false) => {
            out.error(&format!("Tool '{name}' not found in storage."));
            false
        }
        Err(e) => {
            out.error(&e.to_string());
            false
        }
    }
}

pub async fn propose_fix(manager: &ToolManager, out: &Output, component: &str, issue: &str) -> bool {
    match manager.propose_component_rewrite(component, issue).await {
        Ok(rewrite) if out.json => out.emit(&json!({
            "component": rewrite.component,
            "proposed": rewrite.proposed,
            "applied": false,
        })),
        Ok(rewrite) => {
            out.heading(&format!("proposed {} module:", rewrite.component));
            println!("{}", rewrite.proposed.trim_end());
            println!();
            out.note("Not applied. Review the proposal and apply it by hand if it helps.");
            true
        }
        Err(e) => {
            out.error(&format!("no usable proposal: {e}"));
            false
        }
    }
}
