use crate::core::error::UnitErrorKind;
use serde::{Deserialize, Serialize};

/// One unit of work: a blob discovered in the repository tree. The `sha` is
/// the blob's content identity and anchors stable bug identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    pub path: String,
    pub sha: String,
}

impl CodeFile {
    pub fn new(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sha: sha.into(),
        }
    }
}

/// Inclusive 1-based line span. Construction enforces `1 <= start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Option<Self> {
        if start >= 1 && end >= start {
            Some(Self { start, end })
        } else {
            None
        }
    }
}

/// A normalized finding. Created only by the result normalizer from oracle
/// output; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    /// Stable within and across runs: `{blob_sha}-{ordinal}`.
    pub id: String,

    pub title: String,

    pub description: String,

    pub lines: LineRange,

    pub file_path: String,
}

/// Terminal result of one work unit. Exactly one of these is produced per
/// submitted `CodeFile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Success {
        path: String,
        bugs: Vec<Bug>,
    },
    Failure {
        path: String,
        kind: UnitErrorKind,
        message: String,
    },
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            FileOutcome::Success { path, .. } => path,
            FileOutcome::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success { .. })
    }

    pub fn bugs(&self) -> &[Bug] {
        match self {
            FileOutcome::Success { bugs, .. } => bugs,
            FileOutcome::Failure { .. } => &[],
        }
    }
}
