#![warn(clippy::all)]
//! `nosqldb` Server - the HTTP front-end for `nosqldb-core`.
//!
//! Every handler here is a thin pass-through: it resolves a
//! [`nosqldb_core::CollectionHandle`] by name and forwards the request body
//! to one of its five operations, translating the result (or error) into
//! an HTTP response.
//!
//! ## OpenAPI documentation
//!
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod error;
mod handlers;
mod types;

use nosqldb_core::Database;
use utoipa::OpenApi;

pub use types::*;

pub use handlers::collections::{create_collection, list_collections};
pub use handlers::health::health_check;
pub use handlers::objects::{delete_objects, query_objects, update_object, write_object};

/// `nosqldb` API documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "nosqldb API",
        version = "1.4.1",
        description = "HTTP front-end for a small append-only JSON document store."
    ),
    servers((url = "/", description = "Local server")),
    tags(
        (name = "health", description = "Liveness"),
        (name = "collections", description = "Collection management"),
        (name = "objects", description = "Object CRUD and queries")
    ),
    paths(
        handlers::health::health_check,
        handlers::collections::list_collections,
        handlers::collections::create_collection,
        handlers::objects::write_object,
        handlers::objects::query_objects,
        handlers::objects::update_object,
        handlers::objects::delete_objects,
    ),
    components(schemas(
        CreateCollectionRequest,
        CollectionsResponse,
        WriteResponse,
        QueryResponse,
        DeleteResponse,
        HealthResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// State shared across every handler.
pub struct AppState {
    /// The open database, one dispatcher thread per collection.
    pub db: Database,
}
