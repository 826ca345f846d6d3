// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directives sent to the model.
//!
//! Creation, repair and improvement directives all ask for the same JSON
//! object shape so one parser handles every reply.

use std::fmt::Write as _;

use toolforge_core::{ScoredTool, ToolRecord};

const CREATION_EXAMPLE: &str = r#"{
  "tool_name": "circle_area",
  "code": "import math\n\ndef circle_area(radius):\n    \"\"\"Return the area of a circle.\"\"\"\n    if radius < 0:\n        raise ValueError(\"radius must be non-negative\")\n    return math.pi * radius ** 2",
  "description": "Computes the area of a circle from its radius.",
  "parameters": {
    "radius": {"description": "Radius of the circle.", "type": "float", "required": true}
  }
}"#;

fn pretty_parameters(record: &ToolRecord) -> String {
    serde_json::to_string_pretty(&record.parameters).unwrap_or_else(|_| "{}".to_string())
}

/// Asks for a brand-new single-function Python tool.
///
/// `similar` lists existing tools so the model can avoid duplicating one.
pub fn creation_directive(task: &str, similar: &[ScoredTool]) -> String {
    let mut prompt = format!(
        "Write a Python tool for the task below. The tool is one Python function.\n\
         \n\
         Task:\n{task}\n\
         \n\
         Rules:\n\
         - Define exactly one top-level function with a descriptive snake_case name.\n\
         - Prefer the standard library. Put any imports in the code itself.\n\
         - Give the function a docstring covering its arguments and return value.\n\
         - Return a JSON-serializable value.\n\
         \n\
         Reply with a single JSON object and nothing else. Keys:\n\
         - \"tool_name\": the function name.\n\
         - \"code\": the complete Python source, imports and docstring included.\n\
         - \"description\": one sentence saying what the tool does.\n\
         - \"parameters\": an object mapping each argument name to \
         {{\"description\": ..., \"type\": ..., \"required\": true|false}}.\n"
    );

    if !similar.is_empty() {
        prompt.push_str("\nExisting tools that may overlap (only reuse an approach if the task is the same):\n");
        for (i, hit) in similar.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "{}. {}: {}",
                i + 1,
                hit.record.name,
                hit.record.description
            );
        }
    }

    let _ = write!(prompt, "\nExample reply:\n{CREATION_EXAMPLE}\n");
    prompt
}

fn current_tool_section(record: &ToolRecord) -> String {
    format!(
        "Tool name: {name}\n\
         Version: {version}\n\
         Description: {description}\n\
         Parameters:\n{parameters}\n\
         Code:\n{code}\n",
        name = record.name,
        version = record.version,
        description = record.description,
        parameters = pretty_parameters(record),
        code = record.code,
    )
}

/// Asks for a fix of `record` given the failure report it produced.
pub fn repair_directive(record: &ToolRecord, error: &str) -> String {
    format!(
        "The Python tool below failed. Fix it.\n\
         \n\
         {current}\
         \n\
         Failure report:\n{error}\n\
         \n\
         Find the cause in the code and correct it so the same inputs no longer fail. \
         Keep the function name and keep the signature compatible unless the failure \
         requires changing it.\n\
         \n\
         Reply with a single JSON object and nothing else. Keys:\n\
         - \"tool_name\": \"{name}\"\n\
         - \"code\": the complete corrected Python source.\n\
         - \"description\": the description, updated only if behaviour changed.\n\
         - \"parameters\": the parameter schema, updated if the signature changed.\n\
         - \"fix_explanation\": one or two sentences on what was wrong.\n",
        current = current_tool_section(record),
        name = record.name,
    )
}

/// Asks for a change to `record` described in natural language.
pub fn improvement_directive(record: &ToolRecord, request: &str) -> String {
    format!(
        "Modify the Python tool below as requested.\n\
         \n\
         {current}\
         \n\
         Requested change:\n{request}\n\
         \n\
         Update the signature, description and parameter schema so they match the new \
         behaviour. The function name must stay \"{name}\".\n\
         \n\
         Reply with a single JSON object and nothing else. Keys:\n\
         - \"tool_name\": \"{name}\"\n\
         - \"code\": the complete updated Python source.\n\
         - \"description\": the updated description.\n\
         - \"parameters\": the updated parameter schema.\n\
         - \"improvement_summary\": one or two sentences on what changed.\n",
        current = current_tool_section(record),
        name = record.name,
    )
}

/// Asks for a complete replacement of one of this crate's own source files.
pub fn component_rewrite_directive(component: &str, source: &str, issue: &str) -> String {
    format!(
        "You are reviewing `{component}.rs`, a module of a Rust library that creates, \
         runs and repairs small generated Python tools.\n\
         \n\
         Reported issue:\n{issue}\n\
         \n\
         Current contents of `{component}.rs`:\n\
         ```rust\n{source}\n```\n\
         \n\
         Reply with the complete corrected contents of `{component}.rs` and nothing else: \
         no explanation and no partial snippets. The file must still compile as part of \
         the same crate and keep its public API unless the issue requires a change.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_core::ParameterMap;

    fn record() -> ToolRecord {
        let mut params = ParameterMap::new();
        params.insert(
            "x".into(),
            toolforge_core::ParamSpec::from_value(serde_json::json!({"type": "int"})),
        );
        let mut record = ToolRecord::new("double", "def double(x):\n    return x * 2", "Doubles x.", params);
        record.version = 3;
        record
    }

    #[test]
    fn creation_lists_similar_tools() {
        let similar = vec![ScoredTool {
            record: record(),
            distance: 0.4,
        }];
        let prompt = creation_directive("triple a number", &similar);
        assert!(prompt.contains("triple a number"));
        assert!(prompt.contains("1. double: Doubles x."));
        assert!(prompt.contains("\"tool_name\""));
    }

    #[test]
    fn creation_without_similar_tools_has_no_overlap_section() {
        let prompt = creation_directive("anything", &[]);
        assert!(!prompt.contains("Existing tools"));
    }

    #[test]
    fn repair_includes_record_and_error() {
        let prompt = repair_directive(&record(), "Exception:\nZeroDivisionError");
        assert!(prompt.contains("Version: 3"));
        assert!(prompt.contains("def double(x)"));
        assert!(prompt.contains("ZeroDivisionError"));
        assert!(prompt.contains("\"type\": \"int\""));
        assert!(prompt.contains("fix_explanation"));
    }

    #[test]
    fn improvement_pins_the_name() {
        let prompt = improvement_directive(&record(), "accept floats");
        assert!(prompt.contains("accept floats"));
        assert!(prompt.contains("must stay \"double\""));
        assert!(prompt.contains("improvement_summary"));
    }

    #[test]
    fn rewrite_embeds_source() {
        let prompt = component_rewrite_directive("parser", "fn a() {}", "panics on empty input");
        assert!(prompt.contains("`parser.rs`"));
        assert!(prompt.contains("```rust\nfn a() {}\n```"));
    }
}
