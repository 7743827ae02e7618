use crate::core::model::FileOutcome;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Progress notifications emitted over the life of one scan. Serialized
/// event names are kebab-case (`scan-started`, `file-completed`, ...).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScanEvent {
    ScanStarted {
        message: String,
    },
    FilesDiscovered {
        count: usize,
    },
    FileStarted {
        path: String,
        index: usize,
        total: usize,
    },
    FileCompleted {
        outcome: FileOutcome,
    },
    ScanCompleted {
        repo_name: String,
        total_files: usize,
    },
    ScanFailed {
        error: String,
    },
}

/// Observer for scan progress. Delivery is at-least-once per event.
///
/// `emit` runs on the scheduler's task and must not block: a slow or
/// disconnected sink must never stall in-flight units. Implementations that
/// relay elsewhere should buffer (see `ChannelSink`) rather than wait.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

/// Discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ScanEvent) {}
}

/// Logs events through `tracing`.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ScanEvent) {
        match &event {
            ScanEvent::ScanStarted { message } => info!("{message}"),
            ScanEvent::FilesDiscovered { count } => {
                info!("Found {count} code files. Starting security analysis...")
            }
            ScanEvent::FileStarted { path, index, total } => {
                info!("Processing file {index}/{total}: {path}")
            }
            ScanEvent::FileCompleted { outcome } => match outcome {
                FileOutcome::Success { path, bugs } => {
                    info!("Completed {path}: {} bug(s)", bugs.len())
                }
                FileOutcome::Failure { path, message, .. } => {
                    error!("Failed {path}: {message}")
                }
            },
            ScanEvent::ScanCompleted {
                repo_name,
                total_files,
            } => info!("Analysis complete for {repo_name} ({total_files} files)"),
            ScanEvent::ScanFailed { error } => error!("Analysis failed: {error}"),
        }
    }
}

/// Buffers events on an unbounded channel. The send never blocks, so a
/// consumer that stops reading cannot deadlock the scheduler.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ScanEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_kebab_case() {
        let event = ScanEvent::ScanStarted {
            message: "Starting analysis...".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "scan-started");

        let event = ScanEvent::FilesDiscovered { count: 7 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "files-discovered");
        assert_eq!(json["count"], 7);

        let event = ScanEvent::ScanFailed {
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "scan-failed");
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(ScanEvent::FilesDiscovered { count: 1 });
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(ScanEvent::ScanStarted {
            message: "go".to_string(),
        });
        sink.emit(ScanEvent::FilesDiscovered { count: 2 });

        assert!(matches!(
            rx.recv().await.unwrap(),
            ScanEvent::ScanStarted { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            ScanEvent::FilesDiscovered { count: 2 }
        ));
    }
}
