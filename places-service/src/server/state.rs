//! App state for the Axum server.

use std::sync::Arc;

use crate::server::auth::TokenIssuer;
use places_repository::PlaceStore;

/// Page-size configuration for the query handlers.
///
/// The directory page size and the recommendation result count are
/// configuration rather than literals in the handlers.
#[derive(Debug, Clone, Copy)]
pub struct QueryConfig {
    /// Number of places per directory page.
    pub page_size: u64,
    /// Number of results returned by the recommendation query.
    pub nearest_limit: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            nearest_limit: 3,
        }
    }
}

/// State shared across HTTP handlers.
///
/// The store handle is constructed once at startup and shared read-only;
/// handlers hold no other cross-request state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlaceStore>,
    pub query: QueryConfig,
    pub tokens: TokenIssuer,
}
