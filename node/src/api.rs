//! # HTTP API
//!
//! Builds the axum router that exposes the ledger node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path           | Description                               |
//! |--------|----------------|-------------------------------------------|
//! | GET    | `/health`      | Liveness probe                            |
//! | GET    | `/status`      | Version, public key, cached wallet count  |
//! | POST   | `/rpc/:method` | Wallet RPC: raw body in, JSON body out    |
//!
//! `/rpc/:method` always answers 200. Success and failure are told apart by
//! the body: a failed call returns `{"error": "<message>"}`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, Method as HttpMethod, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tally_ledger::rpc::{encode_response, Dispatcher};
use tally_ledger::Method;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything heavy sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Hex-encoded Ed25519 public key derived from the stored RPC seed.
    pub public_key: String,
    /// Routes wallet calls to the ledger.
    pub dispatcher: Arc<Dispatcher>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([HttpMethod::GET, HttpMethod::POST, HttpMethod::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc/:method", post(rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Hex-encoded node public key.
    pub public_key: String,
    /// Wallets currently held in memory.
    pub cached_wallets: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: node identity and cache occupancy.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cached_wallets = state.dispatcher.ledger().cache().len();
    Json(StatusResponse {
        version: state.version.clone(),
        public_key: state.public_key.clone(),
        cached_wallets,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /rpc/:method`: hands the raw body to the dispatcher.
///
/// The request body is passed through untouched, so the content type is
/// not checked and an empty body is a valid empty parameter object.
async fn rpc_handler(
    State(state): State<AppState>,
    Path(method): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    // Unknown names share one label to keep series cardinality bounded.
    let label = method
        .parse::<Method>()
        .map(|m| m.as_str())
        .unwrap_or("unknown");
    let metrics = &state.metrics;
    metrics.requests_total.with_label_values(&[label]).inc();
    let timer = metrics.request_latency_seconds.start_timer();

    let outcome = state.dispatcher.call(&method, &body).await;
    timer.observe_duration();

    match (&outcome, label) {
        (Err(_), _) => metrics.request_errors_total.with_label_values(&[label]).inc(),
        (Ok(_), "createWallet") => metrics.wallets_created_total.inc(),
        (Ok(_), "sendPayment") => metrics.payments_committed_total.inc(),
        (Ok(_), _) => {}
    }
    metrics
        .cached_wallets
        .set(state.dispatcher.ledger().cache().len() as i64);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        encode_response(outcome),
    )
}
