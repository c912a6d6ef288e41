//! `GET /api/power` – live dashboard data polled on request.
//!
//! The round is recorded like a collector tick, but storage problems are only
//! logged: the live view should still render when the database is down.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

use crate::fronius::combine;
use crate::models::PowerDashboard;
use crate::{store, Collector, Config};

// ---

pub fn router() -> Router<(PgPool, Config, Collector)> {
    // ---
    Router::new().route("/api/power", get(handler))
}

async fn handler(
    State((pool, config, collector)): State<(PgPool, Config, Collector)>,
) -> impl IntoResponse {
    // ---
    let devices = collector.poll_all().await;

    if let Err(e) = store::ensure_devices(&pool, collector.devices()).await {
        error!("Failed to register devices: {}", e);
    } else if let Err(e) = store::record_snapshots(&pool, &devices).await {
        error!("Failed to record live snapshots: {}", e);
    }

    let observed_at = Utc::now();
    let combined = combine(&devices, observed_at);
    let any_online = devices.iter().any(|d| d.is_online());
    info!(
        "GET /api/power - {} of {} devices online",
        devices.iter().filter(|d| d.is_online()).count(),
        devices.len()
    );

    let status = if any_online {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = PowerDashboard {
        property: config.property_label,
        updated_at: observed_at,
        devices,
        combined,
    };

    (status, [(header::CACHE_CONTROL, "no-store")], Json(body))
}
