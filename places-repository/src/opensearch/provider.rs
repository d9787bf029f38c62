//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `PlaceStore` using the
//! OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts},
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::PlaceStore;
use crate::opensearch::index_config::{index_settings, IndexConfig};
use crate::types::BulkItemResult;
use places_shared::Place;

/// OpenSearch place store implementation.
///
/// Provides index management, bulk writes and paginated/geo queries using
/// OpenSearch as the backend.
///
/// # Example
///
/// ```ignore
/// use places_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let config = IndexConfig::new("places");
/// let provider = OpenSearchProvider::new("http://localhost:9200", config).await?;
/// let (places, total) = provider.fetch_page(10, 0).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing the index name
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(StoreError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Decode search hits into places, skipping undecodable documents.
    ///
    /// The backend returns loosely-typed nested JSON; one malformed document
    /// must not fail the whole page, so bad hits are logged and dropped.
    fn decode_hits(body: &Value) -> Vec<Place> {
        let Some(hits) = body["hits"]["hits"].as_array() else {
            return Vec::new();
        };

        let mut places = Vec::with_capacity(hits.len());
        for hit in hits {
            match serde_json::from_value::<Place>(hit["_source"].clone()) {
                Ok(place) => places.push(place),
                Err(e) => debug!(error = %e, "Skipping undecodable hit"),
            }
        }
        places
    }

    /// Read the total hit count from a search response.
    fn total_hits(body: &Value) -> Result<u64, StoreError> {
        body["hits"]["total"]["value"]
            .as_u64()
            .ok_or_else(|| StoreError::parse("search response missing hits.total.value"))
    }

    /// Pair each submitted place with its entry in a bulk response.
    ///
    /// Entries are matched by position; a missing or truncated `items` array
    /// marks the unmatched places as failed rather than acknowledged.
    fn bulk_item_results(body: &Value, submitted: &[Place]) -> Vec<BulkItemResult> {
        let items = body["items"].as_array();

        let mut results = Vec::with_capacity(submitted.len());
        for (position, place) in submitted.iter().enumerate() {
            let entry = items
                .and_then(|items| items.get(position))
                .map(|item| &item["index"]);

            let result = match entry {
                Some(entry) => {
                    let status = entry["status"].as_u64().unwrap_or(0);
                    if (200..300).contains(&status) {
                        BulkItemResult::ok(place.id)
                    } else {
                        let reason = entry["error"]["reason"]
                            .as_str()
                            .map(str::to_owned)
                            .unwrap_or_else(|| format!("bulk item returned status {}", status));
                        BulkItemResult::failed(place.id, reason)
                    }
                }
                None => BulkItemResult::failed(place.id, "missing entry in bulk response"),
            };
            results.push(result);
        }
        results
    }
}

#[async_trait]
impl PlaceStore for OpenSearchProvider {
    async fn delete_index(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[self.index_config.name.as_str()]))
            .ignore_unavailable(true)
            .send()
            .await
            .map_err(|e| StoreError::index_deletion(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index delete request failed");
            return Err(StoreError::index_deletion(format!(
                "delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %self.index_config.name, "Index deleted");
        Ok(())
    }

    async fn create_index(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_config.name))
            .body(index_settings())
            .send()
            .await
            .map_err(|e| StoreError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index create request failed");
            return Err(StoreError::index_creation(format!(
                "create failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %self.index_config.name, "Index created");
        Ok(())
    }

    async fn bulk_index(&self, places: &[Place]) -> Result<Vec<BulkItemResult>, StoreError> {
        if places.is_empty() {
            return Ok(Vec::new());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(places.len() * 2);
        for place in places {
            body.push(json!({"index": {"_id": place.document_id()}}).into());
            body.push(
                serde_json::to_value(place)
                    .map_err(|e| StoreError::serialization(e.to_string()))?
                    .into(),
            );
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::bulk(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(StoreError::bulk(format!(
                "bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        Ok(Self::bulk_item_results(&response_body, places))
    }

    async fn fetch_page(&self, limit: u64, offset: u64) -> Result<(Vec<Place>, u64), StoreError> {
        let query = json!({
            "size": limit,
            "from": offset,
            "track_total_hits": true
        });

        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.name.as_str()]))
            .body(query)
            .send()
            .await
            .map_err(|e| StoreError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Page search request failed");
            return Err(StoreError::search(format!(
                "search failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        let places = Self::decode_hits(&body);
        let total = Self::total_hits(&body)?;

        debug!(limit, offset, total, hits = places.len(), "Fetched page");
        Ok((places, total))
    }

    async fn nearest(&self, lat: f64, lon: f64, k: u64) -> Result<Vec<Place>, StoreError> {
        let query = json!({
            "size": k,
            "sort": [
                {
                    "_geo_distance": {
                        "location": {
                            "lat": lat,
                            "lon": lon
                        },
                        "order": "asc",
                        "unit": "km",
                        "mode": "min",
                        "distance_type": "arc",
                        "ignore_unmapped": true
                    }
                }
            ]
        });

        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.name.as_str()]))
            .body(query)
            .send()
            .await
            .map_err(|e| StoreError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Geo search request failed");
            return Err(StoreError::search(format!(
                "search failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        debug!(lat, lon, k, "Fetched nearest places");
        Ok(Self::decode_hits(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use places_shared::GeoPoint;

    fn sample_place(id: u64) -> Place {
        Place::new(
            id,
            format!("Place {}", id),
            "1 Main St",
            "555-0100",
            GeoPoint::new(55.75, 37.61),
        )
    }

    #[test]
    fn test_decode_hits() {
        let body = json!({
            "hits": {
                "total": {"value": 2},
                "hits": [
                    {"_source": {
                        "id": 1, "name": "A", "address": "addr", "phone": "",
                        "location": {"lat": 1.0, "lon": 2.0}
                    }},
                    {"_source": {
                        "id": 2, "name": "B", "address": "addr", "phone": "7",
                        "location": {"lat": 3.0, "lon": 4.0}
                    }}
                ]
            }
        });

        let places = OpenSearchProvider::decode_hits(&body);
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].id, 1);
        assert_eq!(places[1].name, "B");
    }

    #[test]
    fn test_decode_hits_skips_bad_documents() {
        let body = json!({
            "hits": {
                "hits": [
                    {"_source": {"id": "not-a-number", "name": "broken"}},
                    {"_source": {
                        "id": 2, "name": "B", "address": "addr", "phone": "",
                        "location": {"lat": 3.0, "lon": 4.0}
                    }}
                ]
            }
        });

        let places = OpenSearchProvider::decode_hits(&body);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, 2);
    }

    #[test]
    fn test_decode_hits_empty_response() {
        let body = json!({"hits": {"total": {"value": 0}, "hits": []}});
        assert!(OpenSearchProvider::decode_hits(&body).is_empty());

        let body = json!({});
        assert!(OpenSearchProvider::decode_hits(&body).is_empty());
    }

    #[test]
    fn test_total_hits() {
        let body = json!({"hits": {"total": {"value": 25}}});
        assert_eq!(OpenSearchProvider::total_hits(&body).unwrap(), 25);

        let body = json!({"hits": {}});
        assert!(matches!(
            OpenSearchProvider::total_hits(&body),
            Err(StoreError::ParseError(_))
        ));
    }

    #[test]
    fn test_bulk_item_results_all_acknowledged() {
        let submitted = vec![sample_place(1), sample_place(2)];
        let body = json!({
            "errors": false,
            "items": [
                {"index": {"_id": "1", "status": 201}},
                {"index": {"_id": "2", "status": 200}}
            ]
        });

        let results = OpenSearchProvider::bulk_item_results(&body, &submitted);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
    }

    #[test]
    fn test_bulk_item_results_reports_item_failure() {
        let submitted = vec![sample_place(1), sample_place(2)];
        let body = json!({
            "errors": true,
            "items": [
                {"index": {"_id": "1", "status": 201}},
                {"index": {
                    "_id": "2",
                    "status": 400,
                    "error": {"type": "mapper_parsing_exception", "reason": "failed to parse field [location]"}
                }}
            ]
        });

        let results = OpenSearchProvider::bulk_item_results(&body, &submitted);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].id, 2);
        assert_eq!(
            results[1].error.as_deref(),
            Some("failed to parse field [location]")
        );
    }

    #[test]
    fn test_bulk_item_results_truncated_response() {
        let submitted = vec![sample_place(1), sample_place(2)];
        let body = json!({"items": [{"index": {"_id": "1", "status": 201}}]});

        let results = OpenSearchProvider::bulk_item_results(&body, &submitted);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(
            results[1].error.as_deref(),
            Some("missing entry in bulk response")
        );
    }
}
