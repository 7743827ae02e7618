//! Maps raw oracle output into canonical `Bug` values.
//!
//! The oracle's response is untrusted external data even when generation was
//! schema-constrained, so everything is re-validated here: JSON validity,
//! field presence, line arity, and range ordering. On failure the error
//! propagates to the work unit; the file is never silently dropped.

use serde::Deserialize;

use crate::core::error::UnitError;
use crate::core::model::{Bug, CodeFile, LineRange};

#[derive(Debug, Deserialize)]
struct RawBugReport {
    bugs: Vec<RawBug>,
}

#[derive(Debug, Deserialize)]
struct RawBug {
    title: String,
    description: String,
    lines: Vec<i64>,
}

/// Parses and validates one oracle response for `file`, assigning stable
/// content-identity-derived identifiers (`{sha}-{ordinal}`) so identical
/// reruns against an unchanged file produce identical ids.
pub fn normalize_response(raw: &str, file: &CodeFile) -> Result<Vec<Bug>, UnitError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| UnitError::MalformedResponse(e.to_string()))?;

    let report: RawBugReport = serde_json::from_value(value)
        .map_err(|e| UnitError::SchemaViolation(e.to_string()))?;

    report
        .bugs
        .into_iter()
        .enumerate()
        .map(|(ordinal, bug)| {
            let lines = validate_lines(&bug.lines)?;
            Ok(Bug {
                id: format!("{}-{}", file.sha, ordinal),
                title: bug.title,
                description: bug.description,
                lines,
                file_path: file.path.clone(),
            })
        })
        .collect()
}

fn validate_lines(lines: &[i64]) -> Result<LineRange, UnitError> {
    let &[start, end] = lines else {
        return Err(UnitError::SchemaViolation(format!(
            "lines must have exactly two elements, got {}",
            lines.len()
        )));
    };

    let (start_u32, end_u32) = (
        u32::try_from(start).map_err(|_| out_of_range(start, end))?,
        u32::try_from(end).map_err(|_| out_of_range(start, end))?,
    );

    LineRange::new(start_u32, end_u32).ok_or_else(|| out_of_range(start, end))
}

fn out_of_range(start: i64, end: i64) -> UnitError {
    UnitError::SchemaViolation(format!(
        "invalid line range [{start}, {end}]: lines are 1-based and start must not exceed end"
    ))
}
