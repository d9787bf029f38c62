//! Result types shared between the store interface and its callers.

/// Outcome of indexing a single document within a bulk request.
///
/// Bulk writes report per-item acknowledgments so ingestion failures are
/// attributable to specific records rather than a final aggregate count.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    /// Id of the submitted place.
    pub id: u64,
    /// Whether the backend acknowledged the item.
    pub success: bool,
    /// Backend-reported failure reason, when `success` is false.
    pub error: Option<String>,
}

impl BulkItemResult {
    /// An acknowledged item.
    pub fn ok(id: u64) -> Self {
        Self {
            id,
            success: true,
            error: None,
        }
    }

    /// A rejected item with the backend's reason.
    pub fn failed(id: u64, reason: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error: Some(reason.into()),
        }
    }
}
