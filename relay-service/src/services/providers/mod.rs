//! Text-generation provider abstractions and implementations.
//!
//! The relay talks to its upstream through [`TextProvider`] so the Gemini
//! backend can be swapped for the mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Gemini API error {status}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Content filtered by provider")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Upstream detail worth surfacing to the caller, when the provider sent one.
    pub fn details(&self) -> Option<&str> {
        match self {
            ProviderError::ApiError { message, .. } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Fixed sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Maximum output tokens.
    pub max_output_tokens: u32,

    /// Temperature (0.0 - 2.0).
    pub temperature: f32,

    /// Nucleus-sampling threshold.
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 8192,
            temperature: 0.7,
            top_p: 0.4,
        }
    }
}

/// One generation call: a single user-role message plus parameters.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub params: &'a GenerationParams,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text, untrimmed.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: u32,

    /// Output tokens generated.
    pub output_tokens: u32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text for a single user prompt.
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<ProviderResponse, ProviderError>;
}
