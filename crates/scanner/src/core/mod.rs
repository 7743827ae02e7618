//! Core data model, configuration, and error taxonomy shared by the pipeline.

pub mod config;
pub mod error;
pub mod model;

pub use config::ScanConfig;
pub use error::{ScanError, UnitError, UnitErrorKind};
pub use model::{Bug, CodeFile, FileOutcome, LineRange};
