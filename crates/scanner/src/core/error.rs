use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal scan errors. Any of these aborts the whole scan before or during
/// candidate discovery; they surface as a single `scan-failed` event.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),

    #[error("failed to list repository tree: {0}")]
    Listing(String),

    #[error("scan cancelled")]
    Cancelled,
}

/// Recoverable per-file errors. These are caught at the work-unit boundary
/// and become a `Failure` outcome for that file only; sibling units are
/// unaffected.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("content fetch failed: {0}")]
    Fetch(String),

    #[error("path does not resolve to a single file: {0}")]
    NotAFile(String),

    #[error("rate limited by external API: {0}")]
    RateLimited(String),

    #[error("oracle invocation failed: {0}")]
    Oracle(String),

    #[error("oracle response is not valid JSON: {0}")]
    MalformedResponse(String),

    #[error("oracle response violates the bug schema: {0}")]
    SchemaViolation(String),
}

impl UnitError {
    pub fn kind(&self) -> UnitErrorKind {
        match self {
            UnitError::Fetch(_) => UnitErrorKind::Fetch,
            UnitError::NotAFile(_) => UnitErrorKind::NotAFile,
            UnitError::RateLimited(_) => UnitErrorKind::RateLimited,
            UnitError::Oracle(_) => UnitErrorKind::Oracle,
            UnitError::MalformedResponse(_) => UnitErrorKind::MalformedResponse,
            UnitError::SchemaViolation(_) => UnitErrorKind::SchemaViolation,
        }
    }

    /// Rate limiting is the only kind worth retrying at the unit boundary;
    /// everything else is either permanent for this file or already retried
    /// inside the provider.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UnitError::RateLimited(_))
    }
}

/// Serializable discriminant carried inside `FileOutcome::Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitErrorKind {
    Fetch,
    NotAFile,
    RateLimited,
    Oracle,
    MalformedResponse,
    SchemaViolation,
}
