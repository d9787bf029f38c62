//! Place store trait definition.
//!
//! This module defines the abstract interface for the search index, allowing
//! for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::types::BulkItemResult;
use places_shared::Place;

/// Abstracts the underlying search index implementation.
///
/// The store is the single source of truth for indexed places: callers hold
/// no state of their own and re-derive every result set from it. An
/// implementation is constructed once at startup and injected into both the
/// ingestion pipeline and the query handlers, which also makes testing with
/// mock implementations straightforward.
///
/// All methods return `Result<T, StoreError>` for consistent error handling
/// across backends. None of them retry; a failed call is the caller's to
/// surface.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Delete the places index if it exists.
    ///
    /// Absence of the index is not an error, so a rebuild can always start
    /// from this call.
    async fn delete_index(&self) -> Result<(), StoreError>;

    /// Create the places index with its fixed schema.
    ///
    /// The schema maps `name`, `address` and `phone` as free-text fields and
    /// `location` as a geo-point, with a result window large enough for deep
    /// pagination.
    async fn create_index(&self) -> Result<(), StoreError>;

    /// Index a batch of places, keyed by their ids.
    ///
    /// Returns one result per submitted place, in submission order. Item
    /// failures do not fail the batch; callers inspect the per-item results.
    /// Re-submitting an id overwrites the previous document.
    async fn bulk_index(&self, places: &[Place]) -> Result<Vec<BulkItemResult>, StoreError>;

    /// Fetch one page of places in index order.
    ///
    /// Returns the page slice and the total number of indexed places. An
    /// offset beyond the total yields an empty slice with the same total.
    async fn fetch_page(&self, limit: u64, offset: u64) -> Result<(Vec<Place>, u64), StoreError>;

    /// Fetch up to `k` places closest to the given point.
    ///
    /// Results are sorted by ascending arc distance; documents without a
    /// mapped location are ignored rather than failing the query.
    async fn nearest(&self, lat: f64, lon: f64, k: u64) -> Result<Vec<Place>, StoreError>;
}
