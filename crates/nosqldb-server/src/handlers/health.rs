//! Liveness endpoint.

use crate::types::HealthResponse;
use axum::response::{IntoResponse, Json};

/// `GET /health`.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is serving requests", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
