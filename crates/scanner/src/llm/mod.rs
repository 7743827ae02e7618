//! Oracle integration: request framing, provider abstraction, and response
//! normalization.
//!
//! The oracle judges code for security issues; this module only shapes the
//! request (system/user framing plus a machine-checkable output schema) and
//! validates the shape of whatever comes back. Even schema-constrained
//! responses are treated as untrusted external data.

pub mod analyzer;
pub mod mock_provider;
pub mod normalize;
pub mod prompts;
pub mod provider;

pub use analyzer::FileAnalyzer;
pub use mock_provider::MockLLMProvider;
pub use normalize::normalize_response;
pub use provider::{LLMError, LLMProvider, LLMRequest, LLMResponse, OpenAIProvider, TokenUsage};
