// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use draftline_agent::DraftPipeline;
use draftline_core::{DraftlineError, MerchantDirectory, PluginAdapter};
use draftline_cron::PollScheduler;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, internal_auth, poll_auth};
use crate::handlers;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    /// Long-lived adapters polled by GET /health.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<DraftPipeline>,
    pub scheduler: Arc<PollScheduler>,
    pub directory: Arc<dyn MerchantDirectory>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Gateway bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the router:
/// - POST /v1/poll (cron or internal secret)
/// - POST /v1/drafts (internal secret)
/// - GET /health, GET /metrics (public)
pub fn router(state: GatewayState) -> Router {
    let auth = state.auth.clone();

    // Unauthenticated public routes (health + metrics for probes and Prometheus).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let poll_routes = Router::new()
        .route("/v1/poll", post(handlers::post_poll))
        .route_layer(axum_middleware::from_fn_with_state(auth.clone(), poll_auth))
        .with_state(state.clone());

    let draft_routes = Router::new()
        .route("/v1/drafts", post(handlers::post_drafts))
        .route_layer(axum_middleware::from_fn_with_state(auth, internal_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(poll_routes)
        .merge(draft_routes)
        .layer(TraceLayer::new_for_http())
}

/// Serves the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), DraftlineError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DraftlineError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| DraftlineError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
