//! Search store error types.
//!
//! This module defines the unified error type for all operations against the
//! search index backend.

use thiserror::Error;

/// Unified errors from search store operations.
///
/// Used by the `PlaceStore` trait for all index and query operations. Store
/// failures are surfaced to the caller as-is; no layer retries them.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Failed to establish connection to the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete the search index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// Bulk indexing request failed as a whole.
    #[error("Bulk index error: {0}")]
    BulkError(String),

    /// Search request failed.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Failed to parse a response from the search backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize a document for the search backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an index deletion error.
    pub fn index_deletion(msg: impl Into<String>) -> Self {
        Self::IndexDeletionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk(msg: impl Into<String>) -> Self {
        Self::BulkError(msg.into())
    }

    /// Create a search error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
