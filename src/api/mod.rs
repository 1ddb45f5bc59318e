//! The dashboard's HTTP surface.
//!
//! `/api/config` proxies the merged upstream payload; `/api/entries` serves
//! the flattened projection the shell actually renders. Both responses are
//! marked `Cache-Control: no-store` because the data is live.

pub mod error;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::flatten::{flatten, ResourceEntry};
use crate::AppState;
use error::ApiError;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/config", get(get_config))
        .route("/api/entries", get(get_entries))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// The merged upstream payload, exactly as validated.
///
/// GET /api/config
async fn get_config(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let config = state.upstream.fetch_config().await?;
    Ok(no_store(Json(config)))
}

/// Flattened entries response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesResponse {
    pub entries: Vec<ResourceEntry>,
    pub fetched_at: String,
}

/// The flattened, sorted entry list derived from the same aggregation.
///
/// GET /api/entries
async fn get_entries(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let config = state.upstream.fetch_config().await?;
    let entries = flatten(&config.projects);

    Ok(no_store(Json(EntriesResponse {
        entries,
        fetched_at: config.meta.fetched_at,
    })))
}

fn no_store(body: impl IntoResponse) -> Response {
    ([(header::CACHE_CONTROL, "no-store")], body).into_response()
}
