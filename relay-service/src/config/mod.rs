//! Relay configuration.
//!
//! Loaded through `service_core::config::base_builder`, so every key can be
//! overridden with an `APP__`-prefixed environment variable
//! (e.g. `APP__DEPLOYMENT_MODE=function`, `APP__GENERATION__TEMPERATURE=0.2`).

use crate::services::providers::gemini::GEMINI_API_BASE;
use crate::services::GenerationParams;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ROUTE_PATH: &str = "/api/krave-gemini-api";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub port: u16,
    pub host: String,
    pub deployment_mode: DeploymentMode,
    pub route_path: String,
    pub model: String,
    /// Environment variable holding the provider key, read on every request.
    pub api_key_env: String,
    pub provider_base_url: String,
    pub request_timeout_secs: u64,
    /// Largest request body buffered by the handler.
    pub max_body_bytes: usize,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

/// How the compiled artifact exposes the relay handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum DeploymentMode {
    /// Standalone listener serving the handler on `route_path` only.
    Listener,
    /// Single function; the hosting platform decides which requests reach it.
    Function,
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listener" | "testing" | "local" => Ok(DeploymentMode::Listener),
            "function" | "production" | "serverless" => Ok(DeploymentMode::Function),
            other => Err(format!("unknown deployment mode '{}'", other)),
        }
    }
}

impl TryFrom<String> for DeploymentMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Listener => f.write_str("listener"),
            DeploymentMode::Function => f.write_str("function"),
        }
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let generation = GenerationParams::default();

        let config = core_config::base_builder()
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("host", "0.0.0.0")?
            .set_default("deployment_mode", DeploymentMode::Listener.to_string())?
            .set_default("route_path", DEFAULT_ROUTE_PATH)?
            .set_default("model", DEFAULT_MODEL)?
            .set_default("api_key_env", DEFAULT_API_KEY_ENV)?
            .set_default("provider_base_url", GEMINI_API_BASE)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("max_body_bytes", DEFAULT_MAX_BODY_BYTES as i64)?
            .set_default("generation.max_output_tokens", i64::from(generation.max_output_tokens))?
            .set_default("generation.temperature", f64::from(generation.temperature))?
            .set_default("generation.top_p", f64::from(generation.top_p))?
            .build()?;

        let mut relay: RelayConfig = config.try_deserialize()?;
        if relay.otlp_endpoint.is_none() {
            relay.otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty());
        }
        relay.validate()?;

        Ok(relay)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.route_path.starts_with('/') {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "route_path must start with '/', got '{}'",
                self.route_path
            )));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!("model must not be empty")));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "request_timeout_secs must be greater than zero"
            )));
        }
        if self.max_body_bytes == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "max_body_bytes must be greater than zero"
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
