use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::repo::filter::{IGNORED_DIRS, IGNORED_EXTENSIONS};

/// Scan-wide configuration. Loadable from YAML or JSON; every field has a
/// default so a partial file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Concurrency ceiling: at most this many work units in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per unit when the external API rate-limits us.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay for exponential backoff between rate-limit retries.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Override point for tests and GitHub Enterprise deployments.
    #[serde(default = "default_github_api_base")]
    pub github_api_base: String,

    /// If not provided, the GITHUB_TOKEN env var is used (unauthenticated
    /// requests work but are tightly rate-limited).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub github_token: Option<String>,

    /// If not provided, the OPENAI_API_KEY env var is used.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    #[serde(default = "default_ignored_extensions")]
    pub ignored_extensions: Vec<String>,
}

fn default_concurrency() -> usize {
    13
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_timeout_seconds() -> u64 {
    60
}
fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_ignored_dirs() -> Vec<String> {
    IGNORED_DIRS.iter().map(|d| d.to_string()).collect()
}
fn default_ignored_extensions() -> Vec<String> {
    IGNORED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry_attempts: default_retry_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
            github_api_base: default_github_api_base(),
            github_token: None,
            openai_api_key: None,
            ignored_dirs: default_ignored_dirs(),
            ignored_extensions: default_ignored_extensions(),
        }
    }
}

impl ScanConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Credentials are resolved once at startup and treated as read-only for
    /// the life of the process.
    pub fn resolved_github_token(&self) -> Option<String> {
        self.github_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    pub fn resolved_openai_api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}
