// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns free-form model output into a [`Proposal`].
//!
//! Strategies are tried in order and the first structural match wins:
//!
//! 1. `direct_json`: the whole reply is a JSON object.
//! 2. `fenced_json`: a fenced block (optionally tagged `json`) holds one.
//! 3. `heuristic`: regexes pick out a name, a description and a code block.
//!
//! A match only means the mandatory fields were found. Whether their values
//! are usable is decided by the caller.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use toolforge_core::{ParameterMap, parameters_from_value};
use tracing::{debug, warn};

/// A tool definition proposed by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub tool_name: String,
    pub code: String,
    pub description: String,
    /// `None` when the reply carried no usable parameter object.
    pub parameters: Option<ParameterMap>,
    pub fix_explanation: Option<String>,
    pub improvement_summary: Option<String>,
}

impl Proposal {
    /// Names of mandatory fields whose value is blank.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("tool_name", &self.tool_name),
            ("code", &self.code),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Matched(Proposal),
    Mismatch,
}

type Strategy = fn(&str) -> Option<Proposal>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct_json", direct_json),
    ("fenced_json", fenced_json),
    ("heuristic", heuristic),
];

static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced object pattern")
});

static NAME_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)tool_name["']?\s*[:=]\s*["'](\w+)["']"#).expect("name pattern")
});

static DESCRIPTION_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)description["']?\s*[:=]\s*["'](.*?)["']"#).expect("description pattern")
});

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)```(?:python|py)?[ \t]*\n?(.*?)\s*```|code["']?\s*[:=]\s*["'](.*?)["']"#)
        .expect("code pattern")
});

static FUNCTION_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"def\s+(\w+)\s*\(").expect("def pattern"));

/// Runs the strategy chain over `raw`.
pub fn parse_proposal(raw: &str) -> ParseOutcome {
    let text = raw.trim();
    for (name, strategy) in STRATEGIES {
        if let Some(proposal) = strategy(text) {
            debug!(strategy = name, tool = %proposal.tool_name, "model reply parsed");
            return ParseOutcome::Matched(proposal);
        }
    }
    ParseOutcome::Mismatch
}

fn direct_json(text: &str) -> Option<Proposal> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => from_object(map),
        _ => None,
    }
}

fn fenced_json(text: &str) -> Option<Proposal> {
    FENCED_OBJECT.captures_iter(text).find_map(|caps| {
        let body = caps.get(1)?.as_str();
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => from_object(map),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "fenced block is not valid JSON");
                None
            }
        }
    })
}

fn heuristic(text: &str) -> Option<Proposal> {
    let description = DESCRIPTION_ASSIGNMENT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())?;
    let code = CODE_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())?;
    let tool_name = NAME_ASSIGNMENT
        .captures(text)
        .or_else(|| FUNCTION_DEF.captures(&code))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())?;

    if tool_name.is_empty() || code.is_empty() || description.is_empty() {
        return None;
    }
    warn!(tool = %tool_name, "model reply parsed by pattern fallback; parameters were not recovered");
    Some(Proposal {
        tool_name,
        code,
        description,
        parameters: None,
        fix_explanation: None,
        improvement_summary: None,
    })
}

fn from_object(mut map: Map<String, Value>) -> Option<Proposal> {
    let mut take_string = |key: &str| match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };
    let tool_name = take_string("tool_name")?;
    let code = take_string("code")?;
    let description = take_string("description")?;
    let fix_explanation = take_string("fix_explanation");
    let improvement_summary = take_string("improvement_summary");
    let parameters = map.remove("parameters").and_then(parameters_from_value);
    Some(Proposal {
        tool_name,
        code,
        description,
        parameters,
        fix_explanation,
        improvement_summary,
    })
}

/// Removes one leading and one trailing markdown fence from a reply.
///
/// The language tag on the opening fence is dropped with it.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}
