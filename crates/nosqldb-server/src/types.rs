//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body of `POST /collections`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCollectionRequest {
    /// Name of the collection to create.
    pub name: String,
}

/// Body of `GET /collections`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionsResponse {
    /// Names of every registered collection.
    pub collections: Vec<String>,
}

/// Response to a successful write: the object's user id.
#[derive(Debug, Serialize, ToSchema)]
pub struct WriteResponse {
    /// The id the object was stored under.
    pub id: String,
}

/// Response to a query: the matching objects, verbatim.
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    /// Objects matching the query, in no particular order.
    pub objects: Vec<Value>,
}

/// Response to a delete: how many objects were removed.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// Number of objects deleted.
    #[serde(rename = "deleteCount")]
    pub delete_count: usize,
}

/// Response to `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving requests.
    pub status: &'static str,
}

/// Uniform error body: a human-readable message plus the engine's stable
/// short code, when the failure originated in `nosqldb-core`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    pub error: String,
    /// Stable short code (e.g. `"NOSQL-003"`), if the error came from the
    /// storage engine rather than request parsing.
    pub code: Option<&'static str>,
}
