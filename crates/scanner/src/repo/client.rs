use crate::core::error::{ScanError, UnitError};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One entry from the recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub sha: String,
}

/// Remote repository access, split at the two call sites the pipeline needs.
/// The client is process-wide, stateless per scan, and safe to share across
/// concurrently running units.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Full flat listing of the default branch. Failure here is fatal: no
    /// candidate set exists without it.
    async fn list_tree(&self, owner: &str, name: &str) -> Result<Vec<TreeEntry>, ScanError>;

    /// Raw text content of one file. Failures are per-file and recoverable.
    /// No retries happen here; retry policy belongs to the work unit.
    async fn fetch_content(&self, owner: &str, name: &str, path: &str)
        -> Result<String, UnitError>;
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentResponse {
    // A directory path returns an array of entries.
    Directory(Vec<serde_json::Value>),
    File(FileContent),
}

#[derive(Debug, Deserialize)]
struct FileContent {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    content: String,
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kansa/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_base: api_base.into(),
            token,
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl RepoSource for GitHubClient {
    async fn list_tree(&self, owner: &str, name: &str) -> Result<Vec<TreeEntry>, ScanError> {
        let url = format!(
            "{}/repos/{owner}/{name}/git/trees/HEAD?recursive=true",
            self.api_base
        );
        debug!("Listing repository tree: {url}");

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| ScanError::Listing(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Listing(format!(
                "GET tree for {owner}/{name} returned {status}"
            )));
        }

        let tree: TreeResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Listing(e.to_string()))?;

        Ok(tree.tree)
    }

    async fn fetch_content(
        &self,
        owner: &str,
        name: &str,
        path: &str,
    ) -> Result<String, UnitError> {
        let url = format!("{}/repos/{owner}/{name}/contents/{path}", self.api_base);
        debug!("Fetching content: {url}");

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| UnitError::Fetch(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(UnitError::RateLimited(format!(
                "GET {path} returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(UnitError::Fetch(format!("GET {path} returned {status}")));
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| UnitError::Fetch(e.to_string()))?;

        // The strict behavior: a directory or non-file entry is a hard
        // failure for this unit, not an implicit zero-bug success.
        let file = match body {
            ContentResponse::File(file) if file.kind == "file" => file,
            ContentResponse::File(file) => {
                return Err(UnitError::NotAFile(format!(
                    "{path} resolved to entry of type {}",
                    file.kind
                )))
            }
            ContentResponse::Directory(_) => {
                return Err(UnitError::NotAFile(format!("{path} resolved to a directory")))
            }
        };

        // GitHub wraps base64 payloads with newlines.
        let stripped: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(stripped)
            .map_err(|e| UnitError::Fetch(format!("invalid base64 content for {path}: {e}")))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
