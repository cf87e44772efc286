use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::reconcile::LiveReconciler;
use crate::store::GameStore;

const DEFAULT_LOG_LIMIT: usize = 10;
const MAX_LOG_LIMIT: usize = 100;

#[derive(Clone)]
pub struct ServerState {
    reconciler: Arc<LiveReconciler>,
    auth_token: String,
}

impl ServerState {
    pub fn new(reconciler: Arc<LiveReconciler>, auth_token: impl Into<String>) -> Self {
        Self { reconciler, auth_token: auth_token.into() }
    }
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scheduleSync", post(manual_sync))
        .route("/syncLogs", get(sync_logs))
        .with_state(state)
}

/// Serve the manual trigger on an already bound listener until it fails.
pub async fn serve(listener: tokio::net::TcpListener, state: ServerState) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("manual sync endpoint listening on http://{local_addr}");
    axum::serve(listener, router(state)).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn bearer_is_valid(headers: &HeaderMap, expected: &str) -> bool {
    let Some(candidate) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
    else {
        return false;
    };
    !expected.is_empty() && candidate == expected
}

fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "success": false, "error": "unauthorized" })),
    )
}

fn internal_error(message: String) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
}

async fn manual_sync(State(state): State<ServerState>, headers: HeaderMap) -> impl IntoResponse {
    if !bearer_is_valid(&headers, &state.auth_token) {
        warn!("Rejected manual sync without a valid bearer token");
        return unauthorized();
    }

    let reconciler = Arc::clone(&state.reconciler);
    match tokio::task::spawn_blocking(move || reconciler.run(chrono::Utc::now())).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "result": summary })),
        ),
        Err(e) => {
            error!(error = %e, "Manual sync failed");
            internal_error(e.to_string())
        }
    }
}

async fn sync_logs(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    if !bearer_is_valid(&headers, &state.auth_token) {
        return unauthorized();
    }

    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let reconciler = Arc::clone(&state.reconciler);
    match tokio::task::spawn_blocking(move || reconciler.store().recent_logs(limit)).await {
        Ok(Ok(logs)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "logs": logs })),
        ),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to read sync logs");
            internal_error(e.to_string())
        }
        Err(e) => internal_error(e.to_string()),
    }
}
