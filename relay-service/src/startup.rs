//! Application startup and lifecycle management.
//!
//! The same binary serves the relay either as a standalone listener with a
//! single routed path or as a bare function behind a hosting platform's own
//! routing, depending on [`DeploymentMode`].

use crate::config::{DeploymentMode, RelayConfig, DEFAULT_MAX_BODY_BYTES};
use crate::handlers::relay_prompt;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::{GenerationParams, KeySource, TextProvider};
use axum::{middleware::from_fn, routing::any, Router};
use service_core::error::{not_found, AppError};
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{http_trace_layer, request_id_middleware},
};
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn TextProvider>,
    pub key_source: KeySource,
    pub model: String,
    pub params: GenerationParams,
    /// Largest request body the relay buffers, in bytes.
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        key_source: KeySource,
        model: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            provider,
            key_source,
            model: model.into(),
            params,
            body_limit: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// State backed by the Gemini provider, reading the key from the
    /// configured environment variable on each request.
    pub fn from_config(config: &RelayConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(GeminiConfig {
            base_url: config.provider_base_url.clone(),
            timeout: config.request_timeout(),
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            model = %config.model,
            timeout_secs = config.request_timeout_secs,
            "Initialized Gemini text provider"
        );

        Ok(Self::new(
            Arc::new(provider),
            KeySource::Environment(config.api_key_env.clone()),
            config.model.clone(),
            config.generation,
        )
        .with_body_limit(config.max_body_bytes))
    }
}

/// Listener-mode router: the handler on `route_path`, JSON 404 elsewhere.
pub fn relay_listener(state: AppState, route_path: &str) -> Router {
    with_common_layers(
        Router::new()
            .route(route_path, any(relay_prompt))
            .fallback(not_found),
    )
    .with_state(state)
}

/// Function-mode router: every request reaches the handler, whatever its path.
pub fn relay_function(state: AppState) -> Router {
    with_common_layers(Router::new().fallback(relay_prompt)).with_state(state)
}

/// Router for the configured deployment mode.
pub fn build_router(state: AppState, config: &RelayConfig) -> Router {
    match config.deployment_mode {
        DeploymentMode::Listener => relay_listener(state, &config.route_path),
        DeploymentMode::Function => relay_function(state),
    }
}

fn with_common_layers(router: Router<AppState>) -> Router<AppState> {
    router
        .layer(from_fn(security_headers_middleware))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration and the Gemini provider.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;
        Self::build_with_state(config, state).await
    }

    /// Build the application around an existing state (e.g. a mock provider).
    pub async fn build_with_state(config: RelayConfig, state: AppState) -> Result<Self, AppError> {
        let router = build_router(state, &config);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            if e.kind() == ErrorKind::AddrInUse {
                tracing::error!(
                    "Port {} is already in use. Close other processes or try a different port.",
                    config.port
                );
            } else {
                tracing::error!("Failed to bind listener to {}: {}", addr, e);
            }
            AppError::from(e)
        })?;
        let local_addr: SocketAddr = listener.local_addr()?;

        match config.deployment_mode {
            DeploymentMode::Listener => tracing::info!(
                mode = %config.deployment_mode,
                "Relay listening at http://localhost:{}{}",
                local_addr.port(),
                config.route_path
            ),
            DeploymentMode::Function => tracing::info!(
                mode = %config.deployment_mode,
                "Relay function serving all paths on port {}",
                local_addr.port()
            ),
        }

        Ok(Self {
            port: local_addr.port(),
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until `shutdown` resolves.
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send + 'static) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}
