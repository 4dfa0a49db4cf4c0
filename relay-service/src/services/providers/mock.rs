//! Mock provider implementation for testing.

use super::{FinishReason, GenerationRequest, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned outcome returned by [`MockTextProvider`].
enum MockOutcome {
    Text(String),
    Failure(String),
}

/// Mock text provider for testing.
///
/// Answers every call with the same text or the same failure and records
/// how often it was called and with which prompt.
pub struct MockTextProvider {
    outcome: MockOutcome,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockTextProvider {
    /// Provider that always succeeds with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Text(text.into()))
    }

    /// Provider that always fails with a network error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Failure(message.into()))
    }

    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .ok()
            .and_then(|prompt| prompt.clone())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt.to_string());
        }

        match &self.outcome {
            MockOutcome::Text(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: request.prompt.len() as u32 / 4,
                output_tokens: text.len() as u32 / 4,
                finish_reason: FinishReason::Complete,
            }),
            MockOutcome::Failure(message) => Err(ProviderError::NetworkError(message.clone())),
        }
    }
}
