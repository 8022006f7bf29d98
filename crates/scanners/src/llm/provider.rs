//! Low-level LLM provider contract.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),
}

#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse, LLMError>;

    fn model_name(&self) -> &str;

    fn estimate_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }
}
