use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::ScanConfig;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// JSON schema for constrained output. Passed through when the provider
    /// supports it; the response is validated downstream regardless.
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn analyze(&self, request: LLMRequest) -> Result<LLMResponse, LLMError>;

    fn model_name(&self) -> &str;
}

pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    model: String,
    max_retries: u32,
}

impl OpenAIProvider {
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let api_key = config
            .resolved_openai_api_key()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
        Ok(Self::with_config(api_key, config.model.clone()))
    }

    pub fn with_config(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model,
            max_retries: 3,
        }
    }

    fn is_rate_limit(message: &str) -> bool {
        message.contains("429") || message.to_lowercase().contains("rate")
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn analyze(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        debug!("Sending request to OpenAI model: {}", self.model);

        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(|e| LLMError::Api(e.to_string()))?;
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_prompt.as_str())
            .build()
            .map_err(|e| LLMError::Api(e.to_string()))?;

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![system_message.into(), user_message.into()];

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens);

        if let Some(schema) = request.response_schema {
            request_builder.response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: "bug_report".to_string(),
                    schema: Some(schema),
                    strict: Some(true),
                },
            });
        }

        let api_request = request_builder
            .build()
            .map_err(|e| LLMError::Api(e.to_string()))?;

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            debug!("API call attempt {}/{}", attempt, self.max_retries);

            match self.client.chat().create(api_request.clone()).await {
                Ok(response) => break response,
                Err(e) => {
                    let message = e.to_string();
                    warn!("OpenAI API error (attempt {attempt}): {message}");

                    if attempt >= self.max_retries {
                        return Err(if Self::is_rate_limit(&message) {
                            LLMError::RateLimited
                        } else {
                            LLMError::Api(message)
                        });
                    }

                    let wait = if Self::is_rate_limit(&message) {
                        Duration::from_secs(2_u64.pow(attempt))
                    } else {
                        Duration::from_millis(100 * attempt as u64)
                    };
                    tokio::time::sleep(wait).await;
                }
            }
        };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LLMError::InvalidResponse("no content in response".to_string()))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!("Received response with {} tokens", usage.total_tokens);

        Ok(LLMResponse {
            content,
            model: response.model,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
