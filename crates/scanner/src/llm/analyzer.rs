use std::sync::Arc;
use tracing::debug;

use crate::core::config::ScanConfig;
use crate::core::error::UnitError;
use crate::llm::prompts::{build_user_prompt, response_schema, SYSTEM_PROMPT};
use crate::llm::provider::{LLMError, LLMProvider, LLMRequest};

/// Sends one file to the oracle and returns the raw, unvalidated response
/// text. Request shaping lives here; judging the findings does not.
pub struct FileAnalyzer {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl FileAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ScanConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub async fn analyze(&self, path: &str, content: &str) -> Result<String, UnitError> {
        let request = LLMRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(path, content),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_schema: Some(response_schema()),
        };

        let response = self.provider.analyze(request).await.map_err(|e| match e {
            LLMError::RateLimited => UnitError::RateLimited(format!("oracle throttled on {path}")),
            other => UnitError::Oracle(other.to_string()),
        })?;

        debug!(
            "Oracle responded for {path} ({} tokens)",
            response.usage.total_tokens
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock_provider::MockLLMProvider;

    #[tokio::test]
    async fn test_returns_raw_oracle_text() {
        let provider = Arc::new(MockLLMProvider::new());
        let analyzer = FileAnalyzer::new(provider, &ScanConfig::default());

        let raw = analyzer.analyze("src/a.ts", "let a = 1;").await.unwrap();
        assert_eq!(raw, r#"{"bugs":[]}"#);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_unit_error() {
        let provider = Arc::new(MockLLMProvider::new().with_rate_limited_calls(1));
        let analyzer = FileAnalyzer::new(provider, &ScanConfig::default());

        let err = analyzer.analyze("src/a.ts", "x").await.unwrap_err();
        assert!(matches!(err, UnitError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_api_failure_maps_to_oracle_error() {
        let provider = Arc::new(MockLLMProvider::failing());
        let analyzer = FileAnalyzer::new(provider, &ScanConfig::default());

        let err = analyzer.analyze("src/a.ts", "x").await.unwrap_err();
        assert!(matches!(err, UnitError::Oracle(_)));
    }
}
