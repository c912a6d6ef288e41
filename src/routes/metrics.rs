//! `GET /api/metrics` – historical energy summary over a time window.
//!
//! Validates the window, range-queries the snapshot store under the configured
//! timeout and hands the rows to the aggregation. A store failure fails the
//! whole request; no partial summary is returned.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::range::{resolve_range, RangeQuery};
use crate::{metrics, store, Collector, Config};

// ---

pub fn router() -> Router<(PgPool, Config, Collector)> {
    // ---
    Router::new().route("/api/metrics", get(handler))
}

async fn handler(
    Query(params): Query<RangeQuery>,
    State((pool, config, _collector)): State<(PgPool, Config, Collector)>,
) -> Result<impl IntoResponse> {
    // ---
    let range = resolve_range(&params, Utc::now())?;
    info!(
        "GET /api/metrics - {} ({} to {})",
        range.label, range.from, range.to
    );

    let readings = tokio::time::timeout(
        config.query_timeout,
        store::fetch_readings(&pool, range.from, range.to),
    )
    .await
    .map_err(|_| AppError::Timeout)??;

    let summary = metrics::summarize(range, &readings);
    debug!(
        "GET /api/metrics - {} devices, {} timeline points",
        summary.devices.len(),
        summary.timeline.len()
    );

    Ok(([(header::CACHE_CONTROL, "no-store")], Json(summary)))
}
