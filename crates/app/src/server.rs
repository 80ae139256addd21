//! HTTP surface: `GET /price` and `GET /health`.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use pricelens_pipeline::{Pipeline, PriceResponse};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

pub async fn serve(addr: &str, pipeline: Arc<Pipeline>) -> Result<()> {
    let router = router(AppState { pipeline });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/price", get(price_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PriceParams {
    country: String,
    query: String,
}

async fn price_handler(
    State(state): State<AppState>,
    Query(params): Query<PriceParams>,
) -> Json<PriceResponse> {
    Json(lookup(&state.pipeline, &params.country, &params.query).await)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Resolve the currency and run one pipeline pass.
///
/// An unknown country code yields an empty currency string in the response;
/// pipeline degradations show up as a short (possibly empty) price list with
/// per-link statuses.  Nothing here maps to a non-200.
pub async fn lookup(pipeline: &Pipeline, country: &str, query: &str) -> PriceResponse {
    let currency = pricelens_country::currency_for(country).unwrap_or_default();
    let report = pipeline.run(country, query).await;
    report.into_response(currency, query)
}

// ── Tests ────────────────────────────────────────────────────────────────────
