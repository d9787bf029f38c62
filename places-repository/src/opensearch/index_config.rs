//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the places index.

use serde_json::{json, Value};

/// Configuration for the places index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The name of the search index (used for all operations).
    pub name: String,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `name` - The index name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The default name of the places index.
pub const INDEX_NAME: &str = "places";

/// Result window ceiling; must cover the deepest page the directory serves.
pub const MAX_RESULT_WINDOW: u32 = 20_000;

/// Get the index settings and mappings for the places index.
///
/// The configuration includes:
/// - **text** fields for `name`, `address` and `phone`
/// - **geo_point** field for `location`, enabling distance sorting
/// - a single primary shard and a raised `max_result_window` so deep
///   pagination stays within the backend's window
pub fn index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "max_result_window": MAX_RESULT_WINDOW
        },
        "mappings": {
            "properties": {
                "name": {
                    "type": "text"
                },
                "address": {
                    "type": "text"
                },
                "phone": {
                    "type": "text"
                },
                "location": {
                    "type": "geo_point"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = index_settings();

        // Check settings exist
        assert_eq!(settings["settings"]["number_of_shards"], 1);
        assert_eq!(settings["settings"]["max_result_window"], 20_000);

        // Check text mappings
        assert_eq!(settings["mappings"]["properties"]["name"]["type"], "text");
        assert_eq!(
            settings["mappings"]["properties"]["address"]["type"],
            "text"
        );
        assert_eq!(settings["mappings"]["properties"]["phone"]["type"], "text");

        // Check geo-point mapping
        assert_eq!(
            settings["mappings"]["properties"]["location"]["type"],
            "geo_point"
        );
    }

    #[test]
    fn test_index_name() {
        assert_eq!(INDEX_NAME, "places");
    }
}
