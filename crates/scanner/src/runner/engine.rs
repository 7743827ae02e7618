use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::model::{CodeFile, FileOutcome};
use crate::llm::analyzer::FileAnalyzer;
use crate::llm::normalize::normalize_response;
use crate::llm::provider::LLMProvider;
use crate::repo::client::RepoSource;
use crate::repo::filter::filter_candidates;
use crate::repo::locator::RepoLocator;
use crate::runner::progress::{ProgressSink, ScanEvent};

/// Terminal state of one scan: every discovered candidate is accounted for,
/// either with its findings or with an explicit per-file error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub repo_name: String,
    pub total_files: usize,
    pub outcomes: HashMap<String, FileOutcome>,
}

impl ScanReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.total_files
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn total_bugs(&self) -> usize {
        self.outcomes.values().map(|o| o.bugs().len()).sum()
    }
}

/// Folds the outcome stream into a `ScanReport`. Accepts outcomes in any
/// order; inserting a path twice overwrites rather than duplicates.
pub struct ReportBuilder {
    report: ScanReport,
}

impl ReportBuilder {
    pub fn new(repo_name: impl Into<String>, total_files: usize) -> Self {
        Self {
            report: ScanReport {
                repo_name: repo_name.into(),
                total_files,
                outcomes: HashMap::with_capacity(total_files),
            },
        }
    }

    pub fn insert(&mut self, outcome: FileOutcome) {
        let path = outcome.path().to_string();
        if self.report.outcomes.insert(path, outcome).is_some() {
            warn!("Duplicate outcome for a path; keeping the latest");
        }
    }

    pub fn finalize(self) -> ScanReport {
        self.report
    }
}

/// The fan-out/fan-in pipeline. Per candidate file, one work unit runs
/// fetch -> invoke -> normalize, with at most `concurrency` units past the
/// slot-acquisition point at any time. The call returns only after every
/// submitted unit has reached a terminal outcome.
pub struct ScanEngine {
    repo: Arc<dyn RepoSource>,
    provider: Arc<dyn LLMProvider>,
    config: ScanConfig,
}

impl ScanEngine {
    pub fn new(
        repo: Arc<dyn RepoSource>,
        provider: Arc<dyn LLMProvider>,
        config: ScanConfig,
    ) -> Self {
        Self {
            repo,
            provider,
            config,
        }
    }

    /// Runs a full scan of `reference`, streaming progress to `sink`.
    /// Fatal errors surface as a single `scan-failed` event and an `Err`;
    /// per-file errors appear as `Failure` outcomes inside an `Ok` report.
    pub async fn scan(
        &self,
        reference: &str,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        match self.run(reference, Arc::clone(&sink), cancel).await {
            Ok(report) => Ok(report),
            Err(error) => {
                sink.emit(ScanEvent::ScanFailed {
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        reference: &str,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        sink.emit(ScanEvent::ScanStarted {
            message: "Starting analysis...".to_string(),
        });

        let locator = RepoLocator::parse(reference)?;
        let entries = self.repo.list_tree(&locator.owner, &locator.name).await?;
        let candidates = filter_candidates(
            &entries,
            &self.config.ignored_dirs,
            &self.config.ignored_extensions,
        );

        sink.emit(ScanEvent::FilesDiscovered {
            count: candidates.len(),
        });

        let total = candidates.len();
        let analyzer = Arc::new(FileAnalyzer::new(Arc::clone(&self.provider), &self.config));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel::<FileOutcome>();
        let mut units = JoinSet::new();

        for (index, file) in candidates.into_iter().enumerate() {
            let repo = Arc::clone(&self.repo);
            let analyzer = Arc::clone(&analyzer);
            let semaphore = Arc::clone(&semaphore);
            let sink = Arc::clone(&sink);
            let cancel = cancel.clone();
            let tx = tx.clone();
            let owner = locator.owner.clone();
            let name = locator.name.clone();
            let retry_attempts = self.config.retry_attempts;
            let backoff_base_ms = self.config.backoff_base_ms;

            units.spawn(async move {
                // A unit starts only once a free slot exists; cancellation
                // is honored while waiting.
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                };

                sink.emit(ScanEvent::FileStarted {
                    path: file.path.clone(),
                    index: index + 1,
                    total,
                });

                let outcome = run_unit(
                    repo.as_ref(),
                    &analyzer,
                    &owner,
                    &name,
                    &file,
                    retry_attempts,
                    backoff_base_ms,
                    &cancel,
                )
                .await;

                if let Some(outcome) = outcome {
                    // The receiver outlives every sender; a send failure
                    // only happens after the collector stopped caring.
                    let _ = tx.send(outcome);
                }
            });
        }
        drop(tx);

        let mut builder = ReportBuilder::new(locator.name.clone(), total);
        while let Some(outcome) = rx.recv().await {
            sink.emit(ScanEvent::FileCompleted {
                outcome: outcome.clone(),
            });
            builder.insert(outcome);
        }

        // Full join: no early return, even though the channel has drained.
        while units.join_next().await.is_some() {}

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let report = builder.finalize();
        sink.emit(ScanEvent::ScanCompleted {
            repo_name: report.repo_name.clone(),
            total_files: report.total_files,
        });

        Ok(report)
    }
}

/// One unit of work: fetch -> invoke -> normalize, caught into a terminal
/// `FileOutcome`. Rate limiting is retried here with exponential backoff;
/// every other error becomes a `Failure` immediately. Returns `None` only
/// when cancelled mid-unit, in which case the scan as a whole aborts.
#[allow(clippy::too_many_arguments)]
async fn run_unit(
    repo: &dyn RepoSource,
    analyzer: &FileAnalyzer,
    owner: &str,
    name: &str,
    file: &CodeFile,
    retry_attempts: u32,
    backoff_base_ms: u64,
    cancel: &CancellationToken,
) -> Option<FileOutcome> {
    let mut attempt = 0;
    loop {
        attempt += 1;

        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = unit_work(repo, analyzer, owner, name, file) => result,
        };

        match result {
            Ok(bugs) => {
                return Some(FileOutcome::Success {
                    path: file.path.clone(),
                    bugs,
                })
            }
            Err(err) if err.is_retryable() && attempt < retry_attempts => {
                let wait = Duration::from_millis(backoff_base_ms << (attempt - 1));
                debug!(
                    "Rate limited on {} (attempt {attempt}/{retry_attempts}), backing off {wait:?}",
                    file.path
                );
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(wait) => {}
                }
            }
            Err(err) => {
                return Some(FileOutcome::Failure {
                    path: file.path.clone(),
                    kind: err.kind(),
                    message: err.to_string(),
                })
            }
        }
    }
}

async fn unit_work(
    repo: &dyn RepoSource,
    analyzer: &FileAnalyzer,
    owner: &str,
    name: &str,
    file: &CodeFile,
) -> Result<Vec<crate::core::model::Bug>, crate::core::error::UnitError> {
    let content = repo.fetch_content(owner, name, &file.path).await?;
    let raw = analyzer.analyze(&file.path, &content).await?;
    normalize_response(&raw, file)
}
