//! HTTP server setup and routing.

pub mod auth;
pub mod handlers;
pub mod pagination;
pub mod state;

use axum::{http::Method, middleware, routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use self::state::AppState;
use crate::ServiceError;

/// Create the Axum application router with all routes and middleware.
///
/// Only the recommendation route sits behind the bearer-token gate; the
/// directory listing and token issuance are open.
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/recommend", get(handlers::recommend))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/", get(handlers::index_page))
        .route("/api/places", get(handlers::list_places))
        .route("/api/get_token", get(handlers::get_token))
        .route("/health", get(handlers::health_check))
        .merge(protected)
        .layer(create_cors_layer())
        .with_state(state)
}

/// Create the CORS layer for the read-only public API.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([axum::http::header::AUTHORIZATION])
}

/// Run the server on the specified address until shutdown.
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServiceError> {
    info!("Server listening on {}", addr);
    info!("- Directory endpoint: http://{}/api/places", addr);
    info!("- Recommendation endpoint: http://{}/api/recommend", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::server(e.to_string()))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::server(e.to_string()))?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received shutdown signal");
}
