//! Error types for the places repository.
//!
//! This module provides a unified error type for all search store operations.

mod store_error;

pub use store_error::StoreError;
