//! Object CRUD handlers: a thin pass-through to a collection's dispatcher.

use crate::error::ApiError;
use crate::types::{DeleteResponse, QueryResponse, WriteResponse};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use nosqldb_core::CollectionHandle;
use std::sync::Arc;

fn collection_or_404(state: &AppState, name: &str) -> Result<CollectionHandle, ApiError> {
    state
        .db
        .get_collection(name)
        .ok_or_else(|| ApiError::CollectionNotFound(name.to_string()))
}

/// `POST /collections/{name}/objects`.
#[utoipa::path(
    post,
    path = "/collections/{name}/objects",
    tag = "objects",
    params(("name" = String, Path, description = "Collection name")),
    request_body = Object,
    responses(
        (status = 200, description = "Object stored", body = WriteResponse),
        (status = 404, description = "Collection not found", body = crate::types::ErrorResponse)
    )
)]
pub async fn write_object(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let collection = collection_or_404(&state, &name)?;
    let id = collection.write(&body)?;
    Ok(Json(WriteResponse { id }))
}

/// `POST /collections/{name}/query`.
#[utoipa::path(
    post,
    path = "/collections/{name}/query",
    tag = "objects",
    params(("name" = String, Path, description = "Collection name")),
    request_body = Object,
    responses(
        (status = 200, description = "Matching objects", body = QueryResponse),
        (status = 404, description = "Collection not found", body = crate::types::ErrorResponse)
    )
)]
pub async fn query_objects(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let collection = collection_or_404(&state, &name)?;
    let objects = collection.read(&body)?;
    Ok(Json(QueryResponse { objects }))
}

/// `PATCH /collections/{name}/objects/{id}`.
#[utoipa::path(
    patch,
    path = "/collections/{name}/objects/{id}",
    tag = "objects",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "User id of the object to patch")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Parsed merge patch applied", body = Object),
        (status = 404, description = "Collection or object not found", body = crate::types::ErrorResponse)
    )
)]
pub async fn update_object(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let collection = collection_or_404(&state, &name)?;
    let patch = collection.update(&id, &body)?;
    Ok(Json(patch))
}

/// `POST /collections/{name}/delete`.
#[utoipa::path(
    post,
    path = "/collections/{name}/delete",
    tag = "objects",
    params(("name" = String, Path, description = "Collection name")),
    request_body = Object,
    responses(
        (status = 200, description = "Objects deleted", body = DeleteResponse),
        (status = 404, description = "Collection not found", body = crate::types::ErrorResponse)
    )
)]
pub async fn delete_objects(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let collection = collection_or_404(&state, &name)?;
    let delete_count = collection.delete(&body)?;
    Ok(Json(DeleteResponse { delete_count }))
}
