//! # Places Service
//!
//! HTTP service for the places directory. At startup it rebuilds the search
//! index from a tab-separated source file, then serves paginated listings and
//! a "closest places" recommendation endpoint against that index.
//!
//! ## Architecture
//!
//! The service follows a Parser-Loader-Orchestrator pattern for ingestion,
//! with a request-scoped query layer on top:
//!
//! 1. **Parser**: reads the tab-separated source file into place documents
//! 2. **Bulk loader**: batches documents into concurrent index writes
//! 3. **Rebuild orchestrator**: deletes and recreates the index, then drives
//!    the loader; any failure aborts startup
//! 4. **Server**: paginated directory and geo-recommendation HTTP endpoints,
//!    with a bearer-token gate on the recommendation path
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`ingest`]: Parser, bulk loader and rebuild orchestration
//! - [`server`]: Axum routes, handlers and the token gate
//! - [`errors`]: Error types for the service

pub mod config;
pub mod errors;
pub mod ingest;
pub mod server;

pub use config::Dependencies;
pub use errors::{ApiError, IngestError};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// HTTP server error.
    #[error("Server error: {0}")]
    ServerError(String),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }
}
