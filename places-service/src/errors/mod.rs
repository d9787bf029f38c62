//! Error types for the places service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::RebuildPhase;
use places_repository::StoreError;

/// Errors that can occur in the ingestion pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A source row failed to parse. The row is skipped and counted; it does
    /// not abort the load mid-flight.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// The source file could not be opened or read.
    #[error("cannot read source file: {0}")]
    SourceError(String),

    /// The load drained, but some documents were never indexed.
    #[error(
        "bulk load finished with {failed} failed document(s) ({indexed} indexed), \
         first failure: {first}"
    )]
    BulkFailures {
        indexed: u64,
        failed: u64,
        first: String,
    },

    /// The loader's submission channel or a worker task went away.
    #[error("bulk loader channel error: {0}")]
    ChannelError(String),

    /// A rebuild step failed against the store.
    #[error("index {phase} failed: {source}")]
    RebuildError {
        phase: RebuildPhase,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// Create a malformed-record error for the given source line.
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create a source file error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }

    /// Create a rebuild error for the given phase.
    pub fn rebuild(phase: RebuildPhase, source: StoreError) -> Self {
        Self::RebuildError { phase, source }
    }
}

/// Errors returned to HTTP clients.
///
/// Validation errors are rejected at the boundary before any store call;
/// store errors pass their message through as an opaque 500.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The `page` parameter is missing, not a non-negative integer, or past
    /// the last page. The message is fixed regardless of the cause.
    #[error("invalid 'page' value")]
    InvalidPage,

    /// A coordinate parameter is missing or not a number.
    #[error("invalid '{field}' value: expected a number")]
    InvalidCoordinate { field: &'static str },

    /// Bearer credential missing, malformed, invalid or expired.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Token signing failed.
    #[error("could not issue token: {0}")]
    TokenIssueError(String),

    /// The search store rejected or failed the query.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Create an unauthorized error.
    pub fn unauthorized(msg: &'static str) -> Self {
        Self::Unauthorized(msg)
    }

    /// Create a token issuance error.
    pub fn token_issue(msg: impl Into<String>) -> Self {
        Self::TokenIssueError(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPage | Self::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TokenIssueError(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_page_message_is_fixed() {
        assert_eq!(ApiError::InvalidPage.to_string(), "invalid 'page' value");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidPage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidCoordinate { field: "lat" }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("missing bearer token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Store(StoreError::search("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_message_passes_through() {
        let error = ApiError::Store(StoreError::search("node unreachable"));
        assert_eq!(error.to_string(), "Search error: node unreachable");
    }
}
