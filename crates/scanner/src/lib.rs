//! Kansa Scanner - LLM-backed security scan pipeline for remote repositories
//!
//! The pipeline discovers candidate files in a remote repository, fetches
//! their content, invokes an analysis oracle under a strict concurrency
//! ceiling, normalizes the oracle's untrusted output into canonical findings,
//! and streams progress while building a final per-file report. Judgment of
//! what constitutes a security bug is entirely delegated to the oracle; this
//! crate owns the orchestration and the failure isolation around it.

pub mod core;
pub mod llm;
pub mod repo;
pub mod runner;

pub use crate::core::{Bug, CodeFile, FileOutcome, LineRange, ScanConfig, ScanError, UnitError,
    UnitErrorKind};

pub use llm::{FileAnalyzer, LLMError, LLMProvider, MockLLMProvider, OpenAIProvider};

pub use repo::{filter_candidates, GitHubClient, MockRepoSource, RepoLocator, RepoSource,
    TreeEntry};

pub use runner::{ChannelSink, LogSink, NullSink, ProgressSink, ReportBuilder, ScanEngine,
    ScanEvent, ScanReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
