//! REST API for the Redemption Service
//!
//! Thin presentation adapter standing in for the chat form:
//! - POST /api/redeem - Redeem a transaction id for a user
//! - GET /api/redemptions/:transaction_id - Inspect a stored redemption
//! - GET /api/stats - Workflow counters
//! - GET /api/health - Health check
//!
//! Users only ever see the fixed message of a terminal outcome.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::common::logging::log_api_request;
use crate::grant::DiscordUserId;
use crate::redemption::RedemptionService;
use crate::storage::RedemptionStore;
use crate::types::{RedemptionOutcome, RedemptionRequest};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub transaction_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub outcome: RedemptionOutcome,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, details: impl Into<String>) -> Json<Self> {
        Json(Self {
            error: error.to_string(),
            details: Some(details.into()),
        })
    }
}

// =============================================================================
// Application State
// =============================================================================

pub type AppState = RedemptionService;

// =============================================================================
// API Handlers
// =============================================================================

/// POST /api/redeem
///
/// Runs the full redemption workflow and returns the terminal outcome.
async fn handle_redeem(
    State(service): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> impl IntoResponse {
    if req.transaction_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid request", "transaction_id must not be empty"),
        )
            .into_response();
    }
    if req.user_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid request", "user_id must not be empty"),
        )
            .into_response();
    }
    if req.user_id.parse::<DiscordUserId>().is_err() {
        return (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid request", "user_id must be a Discord user id"),
        )
            .into_response();
    }

    let request = RedemptionRequest::new(req.transaction_id, req.user_id);
    log_api_request("POST", "/api/redeem", &request.correlation_id);

    let outcome = service.process(&request).await;

    let response = RedeemResponse {
        outcome,
        message: outcome.user_message().to_string(),
        retryable: outcome.is_retryable(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /api/redemptions/:transaction_id
///
/// Look up who redeemed a transaction id (operator reconciliation).
async fn handle_get_redemption(
    State(service): State<AppState>,
    Path(transaction_id): Path<String>,
) -> impl IntoResponse {
    match service.store().get(&transaction_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(
                "Not found",
                format!("Transaction {} has not been redeemed", transaction_id),
            ),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(target: "redeem::api", error = %e, "Redemption lookup failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("Storage unavailable", "try again later"),
            )
                .into_response()
        }
    }
}

/// GET /api/stats
async fn handle_stats(State(service): State<AppState>) -> impl IntoResponse {
    Json(service.stats().await)
}

/// GET /api/health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ledger-redeem",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// =============================================================================
// Router Setup
// =============================================================================

/// Create the API router with all endpoints
pub fn create_router(service: RedemptionService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/redeem", post(handle_redeem))
        .route("/api/redemptions/:transaction_id", get(handle_get_redemption))
        .route("/api/stats", get(handle_stats))
        .layer(cors)
        .with_state(service)
}

/// Start the API server; returns after Ctrl-C once in-flight requests finish
pub async fn start_server(service: RedemptionService, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(service);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(target: "redeem::api", %addr, "Redemption API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "redeem::api", error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "redeem::api", "Shutting down");
}

// =============================================================================
// Tests
// =============================================================================
