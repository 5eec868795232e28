//! HTTP routes.
//!
//! - `GET /` reports liveness and cache occupancy.
//! - `GET /api/:character` returns the character's equipment, scraping on a
//!   cache miss.

use std::any::Any;
use std::sync::Arc;

use armory_client::Scraper;
use armory_core::ScrapeResult;
use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    scraper: Arc<Scraper>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    message: &'static str,
    cache_size: usize,
    cache_capacity: usize,
    cache_ttl_seconds: u64,
}

/// Build the application router.
pub fn router(scraper: Arc<Scraper>) -> Router {
    let routes = Router::new()
        .route("/", get(status))
        .route("/api/:character", get(character))
        .with_state(AppState { scraper });
    with_layers(routes)
}

/// Apply tracing, CORS and the panic boundary (outermost) to `routes`.
fn with_layers(routes: Router) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(cors::Any);

    routes
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let cache = state.scraper.cache();
    Json(StatusResponse {
        message: "ok",
        cache_size: cache.len(),
        cache_capacity: cache.capacity(),
        cache_ttl_seconds: cache.ttl().as_secs(),
    })
}

async fn character(
    State(state): State<AppState>, Path(character): Path<String>,
) -> Result<Json<Arc<ScrapeResult>>, ApiError> {
    let scrape = state.scraper.scrape(&character).await?;
    Ok(Json(scrape.result))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = detail, "request handler panicked");
    ApiError::internal().into_response()
}
