//! Core trait for LLM scoring providers.
//!
//! Every provider turns one prompt into one free-text reply. Score parsing
//! happens elsewhere, so a provider knows nothing about ratings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for provider calls.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP client could not be built
    #[error("Client setup failed: {0}")]
    Setup(String),

    /// Provider answered with a non-success status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the provider
    #[error("Rate limited by provider")]
    RateLimited,

    /// Transport failure or timeout
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Scripted failure (mock provider)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// A single-turn completion backend.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Display name, also used to tag generated reference answers
    fn name(&self) -> &str;

    /// Send one prompt and return the reply text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// Request for a single completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt, or the bot persona for providers that use one
    pub system_prompt: Option<String>,
    /// Name the provider should answer as, where the API has the notion
    pub assistant_name: Option<String>,
    /// The user turn
    pub prompt: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new request with a user prompt.
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Add a system prompt.
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the assistant persona name.
    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = Some(name.into());
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}
