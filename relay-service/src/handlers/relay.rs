//! The prompt relay endpoint.
//!
//! Validates `{"prompt": "..."}`, forwards it to the configured provider as a
//! single user message, and answers with `{"success": true, "response": ...}`
//! or a JSON error.

use crate::services::ProviderError;
use crate::services::providers::GenerationRequest;
use crate::startup::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use service_core::error::{AppError, ErrorResponse};
use std::time::Instant;
use thiserror::Error;

/// Successful relay response.
#[derive(Debug, Serialize)]
pub struct RelaySuccess {
    pub success: bool,
    pub response: String,
}

/// Provider failure response.
#[derive(Debug, Serialize)]
pub struct RelayFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method Not Allowed. Use POST.")]
    MethodNotAllowed,

    #[error("Empty request body")]
    EmptyBody,

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Failed to read request body")]
    BodyRead(#[source] axum::BoxError),

    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Missing or invalid \"prompt\" in request body.")]
    InvalidPrompt,

    #[error("Google Generative AI API key is missing in environment variables.")]
    MissingApiKey,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::MethodNotAllowed => {
                let mut res =
                    AppError::MethodNotAllowed(anyhow::anyhow!(self.to_string())).into_response();
                res.headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("POST"));
                res
            }
            RelayError::EmptyBody
            | RelayError::BodyTooLarge
            | RelayError::InvalidJson(_)
            | RelayError::InvalidPrompt => {
                AppError::BadRequest(anyhow::anyhow!(self.to_string())).into_response()
            }
            RelayError::MissingApiKey | RelayError::BodyRead(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: self.to_string(),
                    details: None,
                }),
            )
                .into_response(),
            RelayError::Provider(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RelayFailure {
                    success: false,
                    error: err.to_string(),
                    details: err.details().map(str::to_string),
                }),
            )
                .into_response(),
        }
    }
}

/// Pull a non-blank `prompt` string out of a raw request body.
pub fn extract_prompt(body: &[u8]) -> Result<String, RelayError> {
    if body.is_empty() {
        return Err(RelayError::EmptyBody);
    }

    let data: Value = serde_json::from_slice(body).map_err(RelayError::InvalidJson)?;

    match data.get("prompt").and_then(Value::as_str) {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt.to_string()),
        _ => Err(RelayError::InvalidPrompt),
    }
}

/// Buffer the request body, up to `limit` bytes.
async fn read_body(body: axum::body::Body, limit: usize) -> Result<axum::body::Bytes, RelayError> {
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                RelayError::BodyTooLarge
            } else {
                tracing::error!("Body read error: {}", e);
                RelayError::BodyRead(e)
            }
        })
}

/// Relay a prompt to the provider.
///
/// Mounted for every method so non-POST requests get the JSON 405 instead of
/// the router's empty one. The body is only read once the method is known
/// to be POST.
pub async fn relay_prompt(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<RelaySuccess>, RelayError> {
    let (parts, body) = request.into_parts();
    if parts.method != Method::POST {
        tracing::debug!(method = %parts.method, "Rejected non-POST relay request");
        return Err(RelayError::MethodNotAllowed);
    }

    let body = read_body(body, state.body_limit).await.map_err(|e| {
        tracing::debug!(error = %e, limit = state.body_limit, "Rejected relay request body");
        e
    })?;

    let prompt = extract_prompt(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected relay request");
        e
    })?;

    let api_key = state.key_source.resolve().ok_or_else(|| {
        tracing::error!(key_source = ?state.key_source, "Provider API key is not available");
        RelayError::MissingApiKey
    })?;

    let request = GenerationRequest {
        api_key: api_key.expose_secret(),
        model: &state.model,
        prompt: &prompt,
        params: &state.params,
    };

    let started = Instant::now();
    let result = state.provider.generate(&request).await.map_err(|e| {
        tracing::error!(
            model = %state.model,
            error = %e,
            details = e.details().unwrap_or(""),
            "Gemini API error"
        );
        RelayError::from(e)
    })?;

    tracing::info!(
        model = %state.model,
        prompt_len = prompt.len(),
        input_tokens = result.input_tokens,
        output_tokens = result.output_tokens,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Relayed prompt"
    );

    Ok(Json(RelaySuccess {
        success: true,
        response: result.text.trim().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_rejected_first() {
        assert!(matches!(extract_prompt(b""), Err(RelayError::EmptyBody)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            extract_prompt(b"{prompt: hi"),
            Err(RelayError::InvalidJson(_))
        ));
        assert!(matches!(
            extract_prompt(b"   "),
            Err(RelayError::InvalidJson(_))
        ));
    }

    #[test]
    fn prompt_must_be_a_non_blank_string() {
        for body in [
            r#"{}"#,
            r#"{"prompt": "   "}"#,
            r#"{"prompt": 42}"#,
            r#"{"prompt": null}"#,
            r#"["prompt"]"#,
            r#""prompt""#,
        ] {
            assert!(
                matches!(extract_prompt(body.as_bytes()), Err(RelayError::InvalidPrompt)),
                "body {} should be rejected",
                body
            );
        }
    }

    #[test]
    fn prompt_is_forwarded_untrimmed() {
        let prompt = extract_prompt(br#"{"prompt": "  summarise my week  ", "extra": 1}"#).unwrap();
        assert_eq!(prompt, "  summarise my week  ");
    }

    #[test]
    fn provider_error_message_is_passed_through() {
        let err = RelayError::from(ProviderError::NetworkError("connection reset".to_string()));
        assert_eq!(err.to_string(), "Network error: connection reset");
    }
}
