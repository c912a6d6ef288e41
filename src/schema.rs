//! Database schema management for `solarflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `devices` table for configured inverters and the `snapshots`
/// table for polled readings. Safe to call on every startup; no-op if objects
/// already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            device_id  TEXT PRIMARY KEY,
            label      TEXT        NOT NULL,
            url        TEXT        NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One row per device per poll; the history endpoint range-queries this
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshots (
            id          UUID PRIMARY KEY,
            device_id   TEXT             NOT NULL REFERENCES devices (device_id),
            timestamp   TIMESTAMPTZ      NOT NULL,
            generation  DOUBLE PRECISION NOT NULL,
            consumption DOUBLE PRECISION NOT NULL,
            grid        DOUBLE PRECISION NOT NULL,
            status      TEXT             NOT NULL,
            error       TEXT,
            UNIQUE (device_id, timestamp)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_snapshots_timestamp
            ON snapshots (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
