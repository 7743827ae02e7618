//! Remote repository access: reference parsing, tree listing, content
//! retrieval, and candidate filtering.

pub mod client;
pub mod filter;
pub mod locator;
pub mod mock_source;

pub use client::{GitHubClient, RepoSource, TreeEntry};
pub use filter::filter_candidates;
pub use locator::RepoLocator;
pub use mock_source::MockRepoSource;
