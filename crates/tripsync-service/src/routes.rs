//! Axum router and handlers for the TripSync service.
//!
//! # Endpoints
//!
//! - `POST /tools/{name}` - Dispatch a tool call through the registry
//! - `GET /tools` - List registered tools with parameter schemas
//! - `GET /events` - Server-sent events stream of broadcast envelopes
//! - `GET /api/settlement/address` - Vendor receiving address
//! - `GET /api/settlement/price` - Current SOL price with fallback
//! - `GET /metrics` - Prometheus metrics
//! - `GET /health/live`, `GET /health/ready` - Probes

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use tripsync_lib::{settlement, TripContext};
use tripsync_tools::ToolRegistry;

use crate::metrics::{
    metrics_handler, record_broadcast_failures, record_route_computed, record_route_path_points,
    record_tool_invoked,
};
use crate::middleware::{extract_or_generate_request_id, MetricsLayer};
use crate::problem::ProblemDetails;

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<ToolRegistry>,
    context: TripContext,
    client: reqwest::Client,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(context: TripContext) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new(context.clone())),
            context,
            client: reqwest::Client::new(),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn context(&self) -> &TripContext {
        &self.context
    }
}

/// Build the service router over a shared context.
pub fn build_router(context: TripContext) -> Router {
    let state = AppState::new(context);

    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(dispatch_tool))
        .route("/events", get(event_stream))
        .route("/api/settlement/address", get(settlement_address))
        .route("/api/settlement/price", get(settlement_price))
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(MetricsLayer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_registered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

async fn health_live() -> impl IntoResponse {
    let status = HealthStatus {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tools_registered: None,
        started_at: None,
    };
    (StatusCode::OK, Json(status))
}

async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tools_registered: Some(tripsync_tools::registry::TOOL_NAMES.len()),
        started_at: Some(state.started_at.to_rfc3339()),
    };
    (StatusCode::OK, Json(status))
}

/// Handle GET /tools: the registry listing with declared schemas.
async fn list_tools() -> impl IntoResponse {
    Json(json!({ "tools": ToolRegistry::descriptors() }))
}

/// Handle POST /tools/{name}: dispatch through the registry.
///
/// Tool-level failures return 200 with an `error` field so the orchestrator
/// conversation continues; only unknown tools and malformed bodies are HTTP
/// errors.
async fn dispatch_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);

    let args: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) => {
                record_tool_invoked(&name, "bad_request");
                return ProblemDetails::bad_request(
                    format!("request body is not valid JSON: {err}"),
                    request_id.as_str(),
                )
                .into_response();
            }
        }
    };

    info!(request_id = %request_id, tool = %name, "handling tool call");

    let response = match state.registry.dispatch(&name, args).await {
        Ok(value) => {
            record_tool_invoked(&name, "ok");
            if name == "update_map" {
                if let Some(degraded) = value.get("degraded").and_then(Value::as_bool) {
                    record_route_computed(degraded);
                }
                if let Some(path) = value.get("path").and_then(Value::as_array) {
                    record_route_path_points(path.len());
                }
            }
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(err) if err.is_unknown_tool() => {
            record_tool_invoked(&name, "unknown");
            ProblemDetails::unknown_tool(&name, request_id.as_str()).into_response()
        }
        Err(err) => {
            warn!(request_id = %request_id, tool = %name, error = %err, "tool call failed");
            record_tool_invoked(&name, "error");
            (StatusCode::OK, Json(json!({ "error": err }))).into_response()
        }
    };

    record_broadcast_failures(state.context.broadcaster().failure_count());
    response
}

/// Handle GET /events: stream broadcast envelopes as server-sent events.
///
/// Lagged subscribers skip missed envelopes and continue; that is the
/// best-effort delivery contract of the broadcast protocol.
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.context.subscribe_events();

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(envelope) => match Event::default().json_data(&envelope) {
                    Ok(event) => return Some((Ok(event), receiver)),
                    Err(err) => {
                        warn!(error = %err, "failed to encode envelope for SSE, skipping");
                        continue;
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "SSE subscriber lagged, dropping missed envelopes");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /api/settlement/address: the vendor receiving identity.
async fn settlement_address(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "address": state.context.settlement().address() }))
}

/// Handle GET /api/settlement/price: current SOL price for display.
///
/// Uses the documented fallback price when the feed is unavailable, so this
/// endpoint always answers.
async fn settlement_price(State(state): State<AppState>) -> impl IntoResponse {
    let price = settlement::sol_price_usd(&state.client).await;
    Json(json!({
        "sol_price_usd": price,
        "settlement_amount_sol": tripsync_lib::payment::SETTLEMENT_AMOUNT_SOL,
        "settlement_amount_usd": tripsync_lib::payment::SETTLEMENT_AMOUNT_SOL * price,
    }))
}
