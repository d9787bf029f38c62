//! Bulk loader for the places index.
//!
//! Pushes a large sequence of places into the index through a fixed pool of
//! concurrent workers. Submissions flow over a bounded channel, so a slow
//! backend throttles the caller instead of dropping data. Each worker batches
//! documents and flushes when either the accumulated payload size or the
//! flush interval is reached, whichever first.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, instrument, warn};

use crate::errors::IngestError;
use places_repository::PlaceStore;
use places_shared::Place;

/// Configuration for the bulk loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of concurrent flush workers.
    pub workers: usize,
    /// Accumulated payload size that triggers a flush.
    pub flush_bytes: usize,
    /// Time between flushes of a partially filled batch.
    pub flush_interval: Duration,
    /// Capacity of the submission channel; a full channel blocks `add`.
    pub queue_depth: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            flush_bytes: 10_000,
            flush_interval: Duration::from_secs(30),
            queue_depth: 1_000,
        }
    }
}

/// One document that could not be indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub id: u64,
    pub reason: String,
}

/// Aggregate outcome of a completed load.
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Number of documents acknowledged by the store.
    pub indexed: u64,
    /// Documents that were submitted but never indexed.
    pub failures: Vec<ItemFailure>,
}

impl IngestSummary {
    /// Number of failed documents.
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }

    /// Convert a summary with failures into the aggregate error, naming the
    /// first failure cause.
    pub fn into_error(self) -> IngestError {
        let first = self
            .failures
            .first()
            .map(|failure| format!("place {}: {}", failure.id, failure.reason))
            .unwrap_or_else(|| "unknown".to_string());
        IngestError::BulkFailures {
            indexed: self.indexed,
            failed: self.failures.len() as u64,
            first,
        }
    }
}

/// Per-worker tally, merged into the summary on close.
#[derive(Debug, Default)]
struct WorkerReport {
    indexed: u64,
    failures: Vec<ItemFailure>,
}

/// Concurrent batching loader over a `PlaceStore`.
///
/// Submissions are asynchronous relative to the caller; `close` drains all
/// workers and is the single synchronization barrier of the load. Documents
/// are keyed by their place id, so re-running a load overwrites rather than
/// duplicates.
pub struct BulkLoader {
    sender: mpsc::Sender<Place>,
    workers: Vec<JoinHandle<WorkerReport>>,
}

impl BulkLoader {
    /// Spawn the worker pool against the given store.
    pub fn spawn(store: Arc<dyn PlaceStore>, config: LoaderConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker_id| {
                let store = store.clone();
                let receiver = receiver.clone();
                let config = config.clone();
                tokio::spawn(run_worker(worker_id, store, receiver, config))
            })
            .collect();

        Self { sender, workers }
    }

    /// Submit one place for indexing.
    ///
    /// Blocks when the internal buffer is full, throttling the caller rather
    /// than dropping the document.
    pub async fn add(&self, place: Place) -> Result<(), IngestError> {
        self.sender
            .send(place)
            .await
            .map_err(|_| IngestError::channel("all loader workers have stopped"))
    }

    /// Drain all workers and report the aggregate outcome.
    ///
    /// Blocks until every outstanding batch is flushed and acknowledged.
    /// Returns the aggregate error if any document failed; per-item failures
    /// never abort the load itself.
    #[instrument(skip(self))]
    pub async fn close(self) -> Result<IngestSummary, IngestError> {
        drop(self.sender);

        let mut summary = IngestSummary::default();
        for handle in self.workers {
            let report = handle
                .await
                .map_err(|e| IngestError::channel(format!("worker task failed: {}", e)))?;
            summary.indexed += report.indexed;
            summary.failures.extend(report.failures);
        }

        debug!(
            indexed = summary.indexed,
            failed = summary.failed(),
            "Bulk loader drained"
        );

        if summary.failures.is_empty() {
            Ok(summary)
        } else {
            Err(summary.into_error())
        }
    }
}

/// Worker loop: pull, batch, flush on size or interval, drain on close.
async fn run_worker(
    worker_id: usize,
    store: Arc<dyn PlaceStore>,
    receiver: Arc<Mutex<mpsc::Receiver<Place>>>,
    config: LoaderConfig,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    let mut batch: Vec<Place> = Vec::new();
    let mut batch_bytes = 0usize;

    let mut ticker = interval(config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = async { receiver.lock().await.recv().await } => {
                match received {
                    Some(place) => {
                        match serde_json::to_vec(&place) {
                            Ok(raw) => {
                                batch_bytes += raw.len();
                                batch.push(place);
                            }
                            Err(e) => report.failures.push(ItemFailure {
                                id: place.id,
                                reason: format!("serialization failed: {}", e),
                            }),
                        }
                        if batch_bytes >= config.flush_bytes {
                            flush_batch(worker_id, store.as_ref(), &mut batch, &mut batch_bytes, &mut report)
                                .await;
                            ticker.reset();
                        }
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {
                flush_batch(worker_id, store.as_ref(), &mut batch, &mut batch_bytes, &mut report).await;
            }
        }
    }

    // Final drain once the channel closes.
    flush_batch(worker_id, store.as_ref(), &mut batch, &mut batch_bytes, &mut report).await;
    report
}

/// Flush the accumulated batch, recording per-item outcomes.
async fn flush_batch(
    worker_id: usize,
    store: &dyn PlaceStore,
    batch: &mut Vec<Place>,
    batch_bytes: &mut usize,
    report: &mut WorkerReport,
) {
    if batch.is_empty() {
        return;
    }

    let documents = std::mem::take(batch);
    let bytes = std::mem::take(batch_bytes);
    debug!(worker_id, count = documents.len(), bytes, "Flushing batch");

    match store.bulk_index(&documents).await {
        Ok(results) => {
            for result in results {
                if result.success {
                    report.indexed += 1;
                } else {
                    let reason = result
                        .error
                        .unwrap_or_else(|| "not acknowledged by the store".to_string());
                    warn!(id = result.id, reason = %reason, "Failed to index place");
                    report.failures.push(ItemFailure {
                        id: result.id,
                        reason,
                    });
                }
            }
        }
        Err(e) => {
            // A failed flush takes its whole batch down, but the load keeps
            // going for the remaining items.
            error!(worker_id, error = %e, count = documents.len(), "Bulk request failed");
            for place in &documents {
                report.failures.push(ItemFailure {
                    id: place.id,
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use places_repository::{BulkItemResult, StoreError};
    use places_shared::GeoPoint;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Mock store that records indexed ids and can reject selected ids.
    struct MockStore {
        bulk_calls: AtomicUsize,
        indexed_ids: StdMutex<Vec<u64>>,
        reject_ids: Vec<u64>,
        fail_all_batches: bool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                bulk_calls: AtomicUsize::new(0),
                indexed_ids: StdMutex::new(Vec::new()),
                reject_ids: Vec::new(),
                fail_all_batches: false,
            }
        }

        fn rejecting(ids: Vec<u64>) -> Self {
            Self {
                reject_ids: ids,
                ..Self::new()
            }
        }

        fn failing() -> Self {
            Self {
                fail_all_batches: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl PlaceStore for MockStore {
        async fn delete_index(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn create_index(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn bulk_index(&self, places: &[Place]) -> Result<Vec<BulkItemResult>, StoreError> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all_batches {
                return Err(StoreError::bulk("store unreachable"));
            }
            let mut results = Vec::with_capacity(places.len());
            for place in places {
                if self.reject_ids.contains(&place.id) {
                    results.push(BulkItemResult::failed(place.id, "mapping rejected"));
                } else {
                    self.indexed_ids.lock().unwrap().push(place.id);
                    results.push(BulkItemResult::ok(place.id));
                }
            }
            Ok(results)
        }

        async fn fetch_page(
            &self,
            _limit: u64,
            _offset: u64,
        ) -> Result<(Vec<Place>, u64), StoreError> {
            Ok((Vec::new(), 0))
        }

        async fn nearest(&self, _lat: f64, _lon: f64, _k: u64) -> Result<Vec<Place>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn place(id: u64) -> Place {
        Place::new(
            id,
            format!("Place {}", id),
            "1 Main St",
            "555-0100",
            GeoPoint::new(55.75, 37.61),
        )
    }

    fn small_config() -> LoaderConfig {
        LoaderConfig {
            workers: 2,
            flush_bytes: 64,
            flush_interval: Duration::from_secs(30),
            queue_depth: 16,
        }
    }

    #[tokio::test]
    async fn test_load_and_close_indexes_everything() {
        let store = Arc::new(MockStore::new());
        let loader = BulkLoader::spawn(store.clone(), small_config());

        for id in 1..=20 {
            loader.add(place(id)).await.unwrap();
        }
        let summary = loader.close().await.unwrap();

        assert_eq!(summary.indexed, 20);
        assert!(summary.failures.is_empty());

        let mut ids = store.indexed_ids.lock().unwrap().clone();
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_item_failure_becomes_aggregate_error() {
        let store = Arc::new(MockStore::rejecting(vec![2]));
        let loader = BulkLoader::spawn(store.clone(), small_config());

        for id in 1..=3 {
            loader.add(place(id)).await.unwrap();
        }
        let err = loader.close().await.unwrap_err();

        match err {
            IngestError::BulkFailures {
                indexed,
                failed,
                first,
            } => {
                assert_eq!(indexed, 2);
                assert_eq!(failed, 1);
                assert!(first.contains("place 2"));
                assert!(first.contains("mapping rejected"));
            }
            other => panic!("expected BulkFailures, got {:?}", other),
        }

        // The other items still made it in.
        let ids = store.indexed_ids.lock().unwrap().clone();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_failure_attributes_every_item() {
        let store = Arc::new(MockStore::failing());
        let loader = BulkLoader::spawn(store.clone(), small_config());

        for id in 1..=5 {
            loader.add(place(id)).await.unwrap();
        }
        let err = loader.close().await.unwrap_err();

        match err {
            IngestError::BulkFailures {
                indexed, failed, ..
            } => {
                assert_eq!(indexed, 0);
                assert_eq!(failed, 5);
            }
            other => panic!("expected BulkFailures, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_flushes_partial_batch() {
        let store = Arc::new(MockStore::new());
        let config = LoaderConfig {
            workers: 1,
            flush_bytes: 1_000_000, // never reached by one document
            flush_interval: Duration::from_secs(30),
            queue_depth: 16,
        };
        let loader = BulkLoader::spawn(store.clone(), config);

        loader.add(place(1)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(store.indexed_ids.lock().unwrap().len(), 1);
        let summary = loader.close().await.unwrap();
        assert_eq!(summary.indexed, 1);
    }

    #[tokio::test]
    async fn test_byte_threshold_flushes_before_close() {
        let store = Arc::new(MockStore::new());
        let config = LoaderConfig {
            workers: 1,
            flush_bytes: 1, // every document crosses the threshold
            flush_interval: Duration::from_secs(3600),
            queue_depth: 16,
        };
        let loader = BulkLoader::spawn(store.clone(), config);

        loader.add(place(1)).await.unwrap();
        loader.add(place(2)).await.unwrap();
        let summary = loader.close().await.unwrap();

        assert_eq!(summary.indexed, 2);
        // At least one flush happened per threshold crossing, not one big
        // flush at close.
        assert!(store.bulk_calls.load(Ordering::SeqCst) >= 2);
    }
}
