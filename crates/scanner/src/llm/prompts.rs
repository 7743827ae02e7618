//! Fixed request framing for the security analysis oracle.
//!
//! The framing mirrors the response contract exactly: an object with a
//! `bugs` array whose entries carry `title`, `description`, and a two-element
//! `lines` span. The same contract is expressed twice, once as prose for the
//! model and once as a JSON schema for constrained output mode.

use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = "You are a code security auditor. Be concise and precise.";

/// Builds the user prompt: analysis instructions, the required response
/// shape, then the file path and content appended verbatim.
pub fn build_user_prompt(path: &str, content: &str) -> String {
    [
        "Analyze this code for security vulnerabilities.".to_string(),
        "Return an object { bugs: Bug[] }.".to_string(),
        "If none are found, return { bugs: [] }.".to_string(),
        "Each bug must include:".to_string(),
        "- title: short summary".to_string(),
        "- description: explanation of the bug".to_string(),
        "- lines: [start, end] line numbers (use the same value twice if the bug is on one line, e.g. [42,42])".to_string(),
        format!("\nFile path: {path}"),
        format!("Code to analyze:\n{content}"),
    ]
    .join("\n")
}

/// Machine-checkable response schema handed to the oracle when it supports
/// constrained output. The normalizer re-validates everything anyway.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "bugs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "lines": {
                            "type": "array",
                            "minItems": 2,
                            "maxItems": 2,
                            "items": { "type": "integer", "minimum": 1 }
                        }
                    },
                    "required": ["title", "description", "lines"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["bugs"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_path_and_content() {
        let prompt = build_user_prompt("src/auth.ts", "const token = 'hunter2';");
        assert!(prompt.contains("File path: src/auth.ts"));
        assert!(prompt.contains("const token = 'hunter2';"));
        assert!(prompt.starts_with("Analyze this code for security vulnerabilities."));
    }

    #[test]
    fn test_schema_shape() {
        let schema = response_schema();
        assert_eq!(schema["required"][0], "bugs");
        assert_eq!(schema["additionalProperties"], false);

        let lines = &schema["properties"]["bugs"]["items"]["properties"]["lines"];
        assert_eq!(lines["minItems"], 2);
        assert_eq!(lines["maxItems"], 2);
        assert_eq!(lines["items"]["minimum"], 1);
    }
}
