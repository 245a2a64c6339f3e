// handlers/public/health.rs - GET /health

use axum::{extract::State, http::StatusCode, response::Response, response::IntoResponse};
use serde_json::json;

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// Liveness plus a database round trip. 503 when the database is unreachable.
pub async fn health_get(State(state): State<AppState>) -> Response {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.db.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "healthy",
            "timestamp": timestamp,
            "database": "connected",
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiResponse::failure(
                json!({
                    "status": "unhealthy",
                    "timestamp": timestamp,
                    "database": "disconnected",
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
            .into_response()
        }
    }
}
