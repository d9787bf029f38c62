//! Dependency initialization and wiring for the places service.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::ingest::LoaderConfig;
use crate::server::auth::TokenIssuer;
use crate::server::state::{AppState, QueryConfig};
use crate::ServiceError;
use places_repository::opensearch::{IndexConfig, INDEX_NAME};
use places_repository::{OpenSearchProvider, PlaceStore};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default source data file.
const DEFAULT_DATA_FILE: &str = "data/places.tsv";

/// Default HTTP bind address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";

/// Development-only signing secret, used when none is configured.
const DEFAULT_TOKEN_SECRET: &str = "places-dev-secret";

/// Issued-token lifetime.
const TOKEN_TTL_MINUTES: i64 = 5;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Shared store handle, used by both ingestion and the query handlers.
    pub store: Arc<dyn PlaceStore>,
    /// Path of the tab-separated source file.
    pub data_file: PathBuf,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Bulk loader configuration.
    pub loader: LoaderConfig,
    /// State handed to the HTTP handlers.
    pub state: AppState,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `PLACES_INDEX`: index name (default: "places")
    /// - `PLACES_DATA_FILE`: source file path (default: data/places.tsv)
    /// - `PLACES_BIND_ADDR`: HTTP bind address (default: 127.0.0.1:8888)
    /// - `PLACES_PAGE_SIZE`: directory page size (default: 10)
    /// - `PLACES_NEAREST_LIMIT`: recommendation result count (default: 3)
    /// - `PLACES_TOKEN_SECRET`: token signing secret (default: insecure dev secret)
    /// - `PLACES_LOADER_WORKERS`: concurrent flush workers (default: 8)
    /// - `PLACES_LOADER_FLUSH_BYTES`: flush threshold in bytes (default: 10000)
    /// - `PLACES_LOADER_FLUSH_SECS`: flush interval in seconds (default: 30)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If initialization fails
    pub async fn new() -> Result<Self, ServiceError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let index_name = env::var("PLACES_INDEX").unwrap_or_else(|_| INDEX_NAME.to_string());
        let data_file = PathBuf::from(
            env::var("PLACES_DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string()),
        );
        let bind_addr: SocketAddr = env::var("PLACES_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| ServiceError::config(format!("invalid bind address: {}", e)))?;

        let defaults = QueryConfig::default();
        let query = QueryConfig {
            page_size: env_parse("PLACES_PAGE_SIZE", defaults.page_size),
            nearest_limit: env_parse("PLACES_NEAREST_LIMIT", defaults.nearest_limit),
        };
        if query.page_size == 0 {
            return Err(ServiceError::config("PLACES_PAGE_SIZE must be positive"));
        }

        let secret = env::var("PLACES_TOKEN_SECRET").unwrap_or_else(|_| {
            warn!("PLACES_TOKEN_SECRET is not set; using the insecure development secret");
            DEFAULT_TOKEN_SECRET.to_string()
        });
        let tokens = TokenIssuer::new(&secret, chrono::Duration::minutes(TOKEN_TTL_MINUTES));

        let loader_defaults = LoaderConfig::default();
        let loader = LoaderConfig {
            workers: env_parse("PLACES_LOADER_WORKERS", loader_defaults.workers),
            flush_bytes: env_parse("PLACES_LOADER_FLUSH_BYTES", loader_defaults.flush_bytes),
            flush_interval: Duration::from_secs(env_parse(
                "PLACES_LOADER_FLUSH_SECS",
                loader_defaults.flush_interval.as_secs(),
            )),
            queue_depth: loader_defaults.queue_depth,
        };

        info!(
            opensearch_url = %opensearch_url,
            index = %index_name,
            data_file = %data_file.display(),
            bind_addr = %bind_addr,
            page_size = query.page_size,
            nearest_limit = query.nearest_limit,
            loader_workers = loader.workers,
            "Initializing dependencies"
        );

        let provider = OpenSearchProvider::new(&opensearch_url, IndexConfig::new(index_name))
            .await
            .map_err(|e| {
                ServiceError::config(format!("failed to create OpenSearch provider: {}", e))
            })?;
        let store: Arc<dyn PlaceStore> = Arc::new(provider);

        let state = AppState {
            store: store.clone(),
            query,
            tokens,
        };

        Ok(Self {
            store,
            data_file,
            bind_addr,
            loader,
            state,
        })
    }
}

/// Read an environment variable, falling back to the default when it is
/// missing or unparsable.
fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
