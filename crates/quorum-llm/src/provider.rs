//! LLM Provider trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from model backends.
///
/// These are recovered locally by the orchestrator: a failed invocation
/// becomes an error-marker string in the response, never a failure of the
/// overall request.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("rate limited")]
    RateLimited,
    #[error("provider not available")]
    NotAvailable,
}

/// A request to a model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// System prompt; empty for direct prompts.
    pub system: String,
    /// User message (already rendered through a prompt template).
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl LlmRequest {
    /// A direct prompt with conservative defaults.
    pub fn direct(prompt: &str) -> Self {
        Self {
            system: String::new(),
            prompt: prompt.to_string(),
            temperature: 0.2,
            max_tokens: 1500,
        }
    }
}

/// Response from a model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,
    /// Vendor-side model name that produced it
    pub model: String,
    /// Tokens used (if the vendor reports it)
    pub tokens_used: Option<u32>,
    /// Time taken in milliseconds
    pub latency_ms: u64,
}

/// Trait for model backends.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Provider name (vendor, not model id)
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn is_available(&self) -> bool;

    /// Generate a completion
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Generate with a simple prompt (convenience method)
    async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.complete(LlmRequest::direct(prompt)).await?;
        Ok(response.content)
    }
}
