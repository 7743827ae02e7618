use crate::llm::provider::{LLMError, LLMProvider, LLMRequest, LLMResponse, TokenUsage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted oracle for tests. Responses are selected by substring match on
/// the user prompt (file paths work well as patterns); unmatched prompts get
/// the default zero-bug response.
///
/// The in-flight gauge records the peak number of concurrent `analyze` calls,
/// which is what the concurrency-ceiling tests assert against.
pub struct MockLLMProvider {
    responses: HashMap<String, String>,
    default_response: String,
    call_count: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    rate_limited_calls: AtomicUsize,
    latency: Duration,
    should_fail: bool,
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLLMProvider {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: r#"{"bugs":[]}"#.to_string(),
            call_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            rate_limited_calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    /// Returns `raw` for any prompt containing `pattern`.
    pub fn with_response(mut self, pattern: &str, raw: &str) -> Self {
        self.responses.insert(pattern.to_string(), raw.to_string());
        self
    }

    pub fn with_default_response(mut self, raw: &str) -> Self {
        self.default_response = raw.to_string();
        self
    }

    /// Holds each call open long enough for concurrent calls to overlap,
    /// making the in-flight gauge meaningful.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The first `n` calls fail with `RateLimited`, then calls succeed.
    pub fn with_rate_limited_calls(self, n: usize) -> Self {
        self.rate_limited_calls.store(n, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn analyze(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(LLMError::Api("mock provider failure".to_string()));
        }

        let remaining = self
            .rate_limited_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if remaining {
            return Err(LLMError::RateLimited);
        }

        let content = self
            .responses
            .iter()
            .find(|(pattern, _)| request.user_prompt.contains(pattern.as_str()))
            .map(|(_, raw)| raw.clone())
            .unwrap_or_else(|| self.default_response.clone());

        Ok(LLMResponse {
            content,
            model: "mock".to_string(),
            usage: TokenUsage::default(),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompts::{build_user_prompt, SYSTEM_PROMPT};

    fn request_for(path: &str) -> LLMRequest {
        LLMRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(path, "code"),
            temperature: 0.2,
            max_tokens: 100,
            response_schema: None,
        }
    }

    #[tokio::test]
    async fn test_pattern_routing() {
        let provider = MockLLMProvider::new().with_response(
            "src/buggy.ts",
            r#"{"bugs":[{"title":"t","description":"d","lines":[1,1]}]}"#,
        );

        let hit = provider.analyze(request_for("src/buggy.ts")).await.unwrap();
        assert!(hit.content.contains("\"title\""));

        let miss = provider.analyze(request_for("src/clean.ts")).await.unwrap();
        assert_eq!(miss.content, r#"{"bugs":[]}"#);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_budget() {
        let provider = MockLLMProvider::new().with_rate_limited_calls(2);

        assert!(matches!(
            provider.analyze(request_for("a")).await,
            Err(LLMError::RateLimited)
        ));
        assert!(matches!(
            provider.analyze(request_for("a")).await,
            Err(LLMError::RateLimited)
        ));
        assert!(provider.analyze(request_for("a")).await.is_ok());
    }
}
