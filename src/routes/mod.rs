use axum::Router;
use sqlx::PgPool;

use crate::{Collector, Config};

mod health;
mod metrics;
mod power;

// ---

pub fn router(pool: PgPool, config: Config, collector: Collector) -> Router {
    // ---
    Router::new()
        .merge(metrics::router())
        .merge(power::router())
        .merge(health::router())
        .with_state((pool, config, collector))
}
