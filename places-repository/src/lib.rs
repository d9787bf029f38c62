//! # Places Repository
//!
//! This crate provides traits and implementations for interacting with the
//! places search index. It includes definitions for errors, interfaces, and a
//! concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use errors::StoreError;
pub use interfaces::PlaceStore;
pub use opensearch::OpenSearchProvider;
pub use types::BulkItemResult;
