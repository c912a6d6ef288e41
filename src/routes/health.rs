// src/routes/health.rs
//! Liveness probe for the solarflow backend.
//!
//! Sibling of the other endpoint modules under `routes/` (EMBP): the handler
//! stays private and the gateway only sees [`router`]. The probe answers from
//! memory and never touches the database or polls an inverter.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Subrouter with the `/health` route, generic over the gateway state so it
/// merges regardless of what the other endpoints share.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
