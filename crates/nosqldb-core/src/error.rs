//! Error types for `nosqldb`.
//!
//! This module provides a single error type for every engine operation, with
//! a stable short code per variant so HTTP and other front-ends can surface
//! a machine-readable reason alongside the human-readable message.

use thiserror::Error;

/// Result type alias for `nosqldb` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `nosqldb` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body is not valid JSON (NOSQL-001).
    #[error("[NOSQL-001] malformed JSON: {0}")]
    MalformedJson(String),

    /// `read`/`delete` was called with an empty body (NOSQL-002).
    #[error("[NOSQL-002] empty request")]
    EmptyRequest,

    /// An id-keyed `read`/`update` targeted a missing object (NOSQL-003).
    #[error("[NOSQL-003] object '{0}' not found")]
    NotFound(String),

    /// An id-keyed `update` matched more than one object (NOSQL-004).
    ///
    /// Should never occur if the index-table invariants hold; surfaced
    /// rather than silently picking a candidate.
    #[error("[NOSQL-004] ambiguous update: {0} objects matched id '{1}'")]
    Ambiguous(usize, String),

    /// A collection with this name already exists (NOSQL-005).
    #[error("[NOSQL-005] collection '{0}' already exists")]
    CollectionExists(String),

    /// No collection with this name is registered (NOSQL-006).
    #[error("[NOSQL-006] collection '{0}' not found")]
    CollectionNotFound(String),

    /// The on-disk index or attribute file is corrupt (NOSQL-007).
    ///
    /// Fatal: the collection must not be operated on further.
    #[error("[NOSQL-007] corrupt collection state: {0}")]
    Corruption(String),

    /// Underlying filesystem error (NOSQL-008).
    #[error("[NOSQL-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine's dispatcher thread is gone (NOSQL-009).
    ///
    /// Indicates the collection was already shut down, or its dispatcher
    /// thread panicked while handling a previous request.
    #[error("[NOSQL-009] collection '{0}' is no longer accepting requests")]
    Closed(String),
}

impl Error {
    /// Returns the stable short code for this error (e.g. `"NOSQL-003"`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedJson(_) => "NOSQL-001",
            Self::EmptyRequest => "NOSQL-002",
            Self::NotFound(_) => "NOSQL-003",
            Self::Ambiguous(_, _) => "NOSQL-004",
            Self::CollectionExists(_) => "NOSQL-005",
            Self::CollectionNotFound(_) => "NOSQL-006",
            Self::Corruption(_) => "NOSQL-007",
            Self::Io(_) => "NOSQL-008",
            Self::Closed(_) => "NOSQL-009",
        }
    }

    /// Returns true if the collection remains usable after this error.
    ///
    /// `Corruption` is fatal; every other variant is a per-request failure
    /// that leaves the collection's on-disk and in-memory state consistent.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corruption(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_unique() {
        let errors: Vec<Error> = vec![
            Error::MalformedJson("x".into()),
            Error::EmptyRequest,
            Error::NotFound("id".into()),
            Error::Ambiguous(2, "id".into()),
            Error::CollectionExists("c".into()),
            Error::CollectionNotFound("c".into()),
            Error::Corruption("bad slot".into()),
            Error::Io(std::io::Error::other("boom")),
            Error::Closed("c".into()),
        ];
        let codes: Vec<&str> = errors.iter().map(Error::code).collect();
        let mut unique = codes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(codes.len(), unique.len());
    }

    #[test]
    fn only_corruption_is_unrecoverable() {
        assert!(!Error::Corruption("bad".into()).is_recoverable());
        assert!(Error::NotFound("x".into()).is_recoverable());
        assert!(Error::EmptyRequest.is_recoverable());
    }

    #[test]
    fn serde_errors_become_malformed_json() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let e: Error = err.into();
        assert_eq!(e.code(), "NOSQL-001");
    }
}
