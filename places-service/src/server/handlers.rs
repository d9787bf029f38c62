//! HTTP request handlers for the places directory.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::debug;

use crate::errors::ApiError;
use crate::server::pagination::{page_meta, PageMeta};
use crate::server::state::AppState;
use places_shared::Place;

/// Query parameters for the paginated listing routes.
///
/// `page` stays a raw string so a missing or non-integer value maps to the
/// fixed 400 response instead of the framework's rejection.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

/// Query parameters for the recommendation route.
#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    lat: Option<String>,
    lon: Option<String>,
}

/// Paginated directory response.
#[derive(Debug, Serialize)]
pub struct PlacesPage {
    pub name: &'static str,
    pub total: u64,
    pub places: Vec<Place>,
    pub prev_page: u64,
    pub next_page: u64,
    pub last_page: u64,
}

/// Recommendation response.
#[derive(Debug, Serialize)]
pub struct Recommendation {
    pub name: &'static str,
    pub places: Vec<Place>,
}

/// Issued-token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "places service is running")
}

fn parse_page(raw: Option<&str>) -> Result<u64, ApiError> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or(ApiError::InvalidPage)
}

fn parse_coordinate(raw: Option<&str>, field: &'static str) -> Result<f64, ApiError> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or(ApiError::InvalidCoordinate { field })
}

/// Fetch one page and its metadata, rejecting out-of-range requests.
///
/// The total is only known after the fetch, so pages past the end are
/// rejected here rather than before the store call.
async fn load_page(
    state: &AppState,
    raw_page: Option<&str>,
) -> Result<(Vec<Place>, u64, PageMeta), ApiError> {
    let page = parse_page(raw_page)?;
    let limit = state.query.page_size;
    let offset = page.checked_mul(limit).ok_or(ApiError::InvalidPage)?;

    let (places, total) = state.store.fetch_page(limit, offset).await?;
    let meta = page_meta(page, total, limit).ok_or(ApiError::InvalidPage)?;

    debug!(page, total, hits = places.len(), "Loaded directory page");
    Ok((places, total, meta))
}

/// `GET /api/places` - one page of the directory with pagination metadata.
pub async fn list_places(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PlacesPage>, ApiError> {
    let (places, total, meta) = load_page(&state, query.page.as_deref()).await?;

    Ok(Json(PlacesPage {
        name: "Places",
        total,
        places,
        prev_page: meta.prev_page,
        next_page: meta.next_page,
        last_page: meta.last_page,
    }))
}

/// `GET /` - HTML rendering of the same page data as `/api/places`.
pub async fn index_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ApiError> {
    let (places, total, meta) = load_page(&state, query.page.as_deref()).await?;
    Ok(Html(render_listing(&places, total, &meta)))
}

/// `GET /api/recommend` - the places closest to the given point.
pub async fn recommend(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Recommendation>, ApiError> {
    let lat = parse_coordinate(query.lat.as_deref(), "lat")?;
    let lon = parse_coordinate(query.lon.as_deref(), "lon")?;

    let places = state
        .store
        .nearest(lat, lon, state.query.nearest_limit)
        .await?;

    Ok(Json(Recommendation {
        name: "Recommendation",
        places,
    }))
}

/// `GET /api/get_token` - mint a short-lived bearer token.
///
/// No authentication is required to obtain one; see the design notes on the
/// open gap this leaves.
pub async fn get_token(State(state): State<AppState>) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.tokens.issue()?;
    Ok(Json(TokenResponse { token }))
}

fn render_listing(places: &[Place], total: u64, meta: &PageMeta) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><title>Places</title></head><body>\
         <h1>Places</h1><p>Total: {} (page {} of {})</p><ul>",
        total, meta.page, meta.last_page
    );
    for place in places {
        let _ = write!(
            html,
            "<li>{} &mdash; {} &mdash; {}</li>",
            escape(&place.name),
            escape(&place.address),
            escape(&place.phone)
        );
    }
    let _ = write!(html, "</ul>");
    if meta.page > 0 {
        let _ = write!(html, "<a href=\"/?page={}\">Previous</a> ", meta.prev_page);
    }
    if meta.page < meta.last_page {
        let _ = write!(html, "<a href=\"/?page={}\">Next</a>", meta.next_page);
    }
    let _ = write!(html, "</body></html>");
    html
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
