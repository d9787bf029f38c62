//! Ingestion pipeline for the places index.
//!
//! Coordinates the parser and bulk loader behind a single rebuild entry
//! point: delete the index, recreate it with the fixed schema, then stream
//! the parsed source through the loader. The rebuild runs once at startup;
//! any failure is fatal so the service never serves a half-loaded index.

pub mod loader;
pub mod parser;

pub use loader::{BulkLoader, IngestSummary, ItemFailure, LoaderConfig};
pub use parser::{parse_record, PlaceRecords};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::errors::IngestError;
use places_repository::PlaceStore;

/// Phases of the index rebuild state machine.
///
/// A rebuild runs `Deleting -> Creating -> Loading`; the first failing phase
/// is terminal and recorded in the resulting error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPhase {
    Deleting,
    Creating,
    Loading,
}

impl fmt::Display for RebuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleting => write!(f, "deletion"),
            Self::Creating => write!(f, "creation"),
            Self::Loading => write!(f, "loading"),
        }
    }
}

/// Counts from a completed rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildReport {
    /// Number of documents acknowledged by the store.
    pub indexed: u64,
}

/// Delete, recreate and reload the places index from the source file.
///
/// Malformed rows are skipped and counted while well-formed rows keep
/// flowing; once the loader drains, any failure (malformed or unindexed)
/// surfaces as one aggregate error so the caller can abort startup.
#[instrument(skip(store, config), fields(data_file = %data_file.display()))]
pub async fn rebuild_index(
    store: Arc<dyn PlaceStore>,
    data_file: &Path,
    config: LoaderConfig,
) -> Result<RebuildReport, IngestError> {
    info!("Rebuilding places index");

    store
        .delete_index()
        .await
        .map_err(|e| IngestError::rebuild(RebuildPhase::Deleting, e))?;
    store
        .create_index()
        .await
        .map_err(|e| IngestError::rebuild(RebuildPhase::Creating, e))?;

    let records = PlaceRecords::open(data_file)?;
    let loader = BulkLoader::spawn(store, config);

    let mut malformed: u64 = 0;
    let mut first_malformed: Option<String> = None;
    for record in records {
        match record {
            Ok(place) => loader.add(place).await?,
            Err(e @ IngestError::MalformedRecord { .. }) => {
                warn!(error = %e, "Skipping malformed source row");
                if first_malformed.is_none() {
                    first_malformed = Some(e.to_string());
                }
                malformed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let (indexed, failed, first_failure) = match loader.close().await {
        Ok(summary) => (summary.indexed, 0, None),
        Err(IngestError::BulkFailures {
            indexed,
            failed,
            first,
        }) => (indexed, failed, Some(first)),
        Err(e) => return Err(e),
    };

    let failed_total = failed + malformed;
    if failed_total > 0 {
        let first = first_malformed
            .or(first_failure)
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            indexed,
            failed = failed_total,
            first = %first,
            "Rebuild completed with failures"
        );
        return Err(IngestError::BulkFailures {
            indexed,
            failed: failed_total,
            first,
        });
    }

    info!(indexed, "Places index rebuilt");
    Ok(RebuildReport { indexed })
}
