use crate::core::error::{ScanError, UnitError};
use crate::repo::client::{RepoSource, TreeEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory repository for tests and offline development. Paths can be
/// configured to fail permanently or to rate-limit a fixed number of times
/// before succeeding, which exercises the unit-boundary retry path.
pub struct MockRepoSource {
    entries: Vec<TreeEntry>,
    contents: HashMap<String, String>,
    fetch_failures: HashMap<String, String>,
    rate_limit_budget: Mutex<HashMap<String, u32>>,
    fetch_count: AtomicUsize,
    fail_listing: bool,
}

impl Default for MockRepoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepoSource {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            contents: HashMap::new(),
            fetch_failures: HashMap::new(),
            rate_limit_budget: Mutex::new(HashMap::new()),
            fetch_count: AtomicUsize::new(0),
            fail_listing: false,
        }
    }

    pub fn failing_listing() -> Self {
        let mut source = Self::new();
        source.fail_listing = true;
        source
    }

    /// Registers a blob with content; the sha is derived from the path so
    /// bug identifiers stay predictable in assertions.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.entries.push(TreeEntry {
            path: path.to_string(),
            kind: "blob".to_string(),
            sha: format!("sha-{path}"),
        });
        self.contents.insert(path.to_string(), content.to_string());
        self
    }

    /// Registers a non-blob entry (directory, submodule) in the listing.
    pub fn with_tree_entry(mut self, path: &str, kind: &str) -> Self {
        self.entries.push(TreeEntry {
            path: path.to_string(),
            kind: kind.to_string(),
            sha: format!("sha-{path}"),
        });
        self
    }

    pub fn with_fetch_failure(mut self, path: &str, message: &str) -> Self {
        self.fetch_failures
            .insert(path.to_string(), message.to_string());
        self
    }

    /// The first `times` fetches of `path` fail with `RateLimited`, then
    /// succeed normally.
    pub fn with_rate_limited(self, path: &str, times: u32) -> Self {
        self.rate_limit_budget
            .lock()
            .unwrap()
            .insert(path.to_string(), times);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoSource for MockRepoSource {
    async fn list_tree(&self, _owner: &str, _name: &str) -> Result<Vec<TreeEntry>, ScanError> {
        if self.fail_listing {
            return Err(ScanError::Listing("mock listing failure".to_string()));
        }
        Ok(self.entries.clone())
    }

    async fn fetch_content(
        &self,
        _owner: &str,
        _name: &str,
        path: &str,
    ) -> Result<String, UnitError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.fetch_failures.get(path) {
            return Err(UnitError::Fetch(message.clone()));
        }

        {
            let mut budget = self.rate_limit_budget.lock().unwrap();
            if let Some(remaining) = budget.get_mut(path) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(UnitError::RateLimited(format!("mock throttle on {path}")));
                }
            }
        }

        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| UnitError::NotAFile(format!("{path} is not a file in the mock tree")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_listing_and_fetch() {
        let source = MockRepoSource::new()
            .with_file("src/a.ts", "let a = 1;")
            .with_tree_entry("src", "tree");

        let tree = source.list_tree("o", "r").await.unwrap();
        assert_eq!(tree.len(), 2);

        let content = source.fetch_content("o", "r", "src/a.ts").await.unwrap();
        assert_eq!(content, "let a = 1;");
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_budget_is_consumed() {
        let source = MockRepoSource::new()
            .with_file("a.ts", "x")
            .with_rate_limited("a.ts", 2);

        assert!(matches!(
            source.fetch_content("o", "r", "a.ts").await,
            Err(UnitError::RateLimited(_))
        ));
        assert!(matches!(
            source.fetch_content("o", "r", "a.ts").await,
            Err(UnitError::RateLimited(_))
        ));
        assert_eq!(source.fetch_content("o", "r", "a.ts").await.unwrap(), "x");
    }
}
