//! Collection management handlers.

use crate::error::ApiError;
use crate::types::{CollectionsResponse, CreateCollectionRequest};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use std::sync::Arc;

/// `GET /collections`.
#[utoipa::path(
    get,
    path = "/collections",
    tag = "collections",
    responses(
        (status = 200, description = "Registered collections", body = CollectionsResponse)
    )
)]
pub async fn list_collections(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(CollectionsResponse {
        collections: state.db.list_collections(),
    })
}

/// `POST /collections`.
#[utoipa::path(
    post,
    path = "/collections",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created"),
        (status = 409, description = "Collection already exists", body = crate::types::ErrorResponse)
    )
)]
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCollectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.create_collection(&req.name)?;
    Ok(StatusCode::CREATED)
}
