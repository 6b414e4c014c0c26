// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles POST /v1/poll, POST /v1/drafts, GET /health and GET /metrics.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use draftline_agent::DraftOutcome;
use draftline_core::types::{HealthStatus, MailProviderKind, MerchantId};
use draftline_core::{DraftlineError, PluginAdapter};
use draftline_cron::{MerchantRunResult, PollError, PollRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::server::{GatewayState, HealthState};

/// Request body for POST /v1/poll. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollBody {
    #[serde(default)]
    pub clerk_user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub user_limit: Option<usize>,
}

/// Response body for POST /v1/poll.
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub success: bool,
    pub processed: usize,
    pub results: Vec<MerchantRunResult>,
}

/// Request body for POST /v1/drafts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    /// External identity of the merchant.
    #[serde(default)]
    pub clerk_user_id: Option<String>,
    /// Internal merchant id, used when no external identity is given.
    #[serde(default)]
    pub user_id: Option<String>,
    pub message_id: String,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Response body for POST /v1/drafts.
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: DraftOutcome,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`, the worst of the adapter states.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

/// One adapter's entry in the health response.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn failure(err: &DraftlineError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(error = %err, "request failed");
    }
    error_response(status, err.to_string())
}

/// Parses an optional JSON body; an empty body yields the default.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {e}")))
}

/// POST /v1/poll
///
/// Runs one poll over the requested (or all eligible) merchants.
pub async fn post_poll(State(state): State<GatewayState>, body: Bytes) -> Response {
    let body: PollBody = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = PollRequest {
        external_ids: body.clerk_user_ids.unwrap_or_default(),
        user_limit: body.user_limit,
    };

    match state.scheduler.run(request).await {
        Ok(report) => Json(PollResponse {
            success: true,
            processed: report.processed,
            results: report.results,
        })
        .into_response(),
        Err(PollError::Busy) => error_response(StatusCode::CONFLICT, PollError::Busy.to_string()),
        Err(PollError::Failed(e)) => failure(&e),
    }
}

/// POST /v1/drafts
///
/// Fetches one message and runs it through the draft pipeline.
pub async fn post_drafts(State(state): State<GatewayState>, body: Bytes) -> Response {
    let request: DraftRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {e}")),
    };
    match handle_draft(&state, request).await {
        Ok(outcome) => Json(DraftResponse {
            success: true,
            outcome,
        })
        .into_response(),
        Err(e) => failure(&e),
    }
}

async fn handle_draft(state: &GatewayState, request: DraftRequest) -> Result<DraftOutcome, DraftlineError> {
    let message_id = request.message_id.trim();
    if message_id.is_empty() {
        return Err(DraftlineError::Validation("messageId is required".into()));
    }
    let provider = match request.provider.as_deref() {
        None => MailProviderKind::Gmail,
        Some(raw) => raw
            .parse::<MailProviderKind>()
            .map_err(|_| DraftlineError::Validation(format!("unknown provider `{raw}`")))?,
    };

    let merchant = match (request.clerk_user_id, request.user_id) {
        (Some(external_id), _) => state
            .directory
            .resolve_merchant(&external_id)
            .await?
            .map(|m| m.id)
            .ok_or_else(|| DraftlineError::NotFound(format!("unknown merchant `{external_id}`")))?,
        (None, Some(user_id)) => MerchantId(user_id),
        (None, None) => {
            return Err(DraftlineError::Validation(
                "clerkUserId or userId is required".into(),
            ));
        }
    };

    state.pipeline.process_by_id(&merchant, provider, message_id).await
}

/// GET /health (unauthenticated)
///
/// 503 when any adapter reports itself unhealthy or its check fails.
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let mut adapters = Vec::with_capacity(state.health.adapters.len());
    for adapter in &state.health.adapters {
        adapters.push(adapter_health(adapter.as_ref()).await);
    }
    let response = health_response(&state.health, adapters);
    let status = if response.status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

async fn adapter_health(adapter: &dyn PluginAdapter) -> AdapterHealth {
    let (status, detail) = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => ("healthy", None),
        Ok(HealthStatus::Degraded(detail)) => ("degraded", Some(detail)),
        Ok(HealthStatus::Unhealthy(detail)) => ("unhealthy", Some(detail)),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    if status != "healthy" {
        tracing::warn!(adapter = adapter.name(), status, detail = ?detail, "adapter health check not passing");
    }
    AdapterHealth {
        name: adapter.name().to_string(),
        version: adapter.version().to_string(),
        kind: adapter.adapter_type().to_string(),
        status: status.to_string(),
        detail,
    }
}

fn health_response(health: &HealthState, adapters: Vec<AdapterHealth>) -> HealthResponse {
    let status = if adapters.iter().any(|a| a.status == "unhealthy") {
        "unhealthy"
    } else if adapters.iter().any(|a| a.status == "degraded") {
        "degraded"
    } else {
        "ok"
    };
    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: health.start_time.elapsed().as_secs(),
        adapters,
    }
}

/// GET /metrics (unauthenticated)
///
/// Prometheus text exposition, empty when no recorder is installed.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    let body = state
        .health
        .prometheus_render
        .as_ref()
        .map(|render| render())
        .unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
