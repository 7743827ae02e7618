//! Scan orchestration: the bounded-concurrency engine, outcome aggregation,
//! and the progress event stream.
//!
//! The engine fans one work unit out per candidate file under a global
//! concurrency ceiling, folds outcomes back into a single report, and emits
//! ordered progress events as units complete. One file's failure never
//! aborts or delays its siblings.

pub mod engine;
pub mod progress;

pub use engine::{ReportBuilder, ScanEngine, ScanReport};
pub use progress::{ChannelSink, LogSink, NullSink, ProgressSink, ScanEvent};
