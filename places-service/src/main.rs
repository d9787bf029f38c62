//! Places Service Main Entry Point
//!
//! This is the main binary for the places directory service. It rebuilds the
//! places index from the source file at startup, then serves the directory
//! and recommendation HTTP API.

use dotenv::dotenv;
use places_service::{ingest, server, Dependencies, ServiceError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("places_service=info,places_repository=info"));

    if env::var("LOG_JSON").is_ok() {
        // JSON format for structured log shipping
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        // Pretty console output for local runs
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "places-service",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting places service");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    // The service must not serve an empty or half-loaded index; a failed
    // rebuild aborts startup.
    let report =
        match ingest::rebuild_index(deps.store.clone(), &deps.data_file, deps.loader.clone()).await
        {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Index rebuild failed");
                return Err(e.into());
            }
        };
    info!(indexed = report.indexed, "Places index ready");

    let app = server::create_app(deps.state);
    server::run_server(app, deps.bind_addr).await
}
