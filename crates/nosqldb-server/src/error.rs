//! Maps engine failures onto HTTP status codes (spec §7).

use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The storage engine rejected the request.
    #[error(transparent)]
    Engine(#[from] nosqldb_core::Error),
    /// The named collection is not registered.
    #[error("collection '{0}' not found")]
    CollectionNotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::CollectionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Engine(nosqldb_core::Error::NotFound(_) | nosqldb_core::Error::CollectionNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Engine(
                nosqldb_core::Error::MalformedJson(_)
                | nosqldb_core::Error::EmptyRequest
                | nosqldb_core::Error::Ambiguous(_, _),
            ) => StatusCode::BAD_REQUEST,
            Self::Engine(nosqldb_core::Error::CollectionExists(_)) => StatusCode::CONFLICT,
            Self::Engine(
                nosqldb_core::Error::Io(_)
                | nosqldb_core::Error::Corruption(_)
                | nosqldb_core::Error::Closed(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            Self::Engine(err) => Some(err.code()),
            Self::CollectionNotFound(_) => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Engine(err) = &self {
            if !err.is_recoverable() {
                tracing::error!(code = err.code(), "unrecoverable error serving request: {err}");
            }
        }
        let status = self.status();
        let code = self.code();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                code,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::Engine(nosqldb_core::Error::NotFound("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn corruption_maps_to_500() {
        let resp = ApiError::Engine(nosqldb_core::Error::Corruption("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unregistered_collection_maps_to_404() {
        let resp = ApiError::CollectionNotFound("ghost".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
