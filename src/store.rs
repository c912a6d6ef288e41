//! Snapshot persistence: device registry, snapshot inserts and range reads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DeviceConfig;
use crate::models::{Reading, SnapshotRow};

// ---

/// Upsert every configured device so snapshots can reference it.
pub async fn ensure_devices(pool: &PgPool, devices: &[DeviceConfig]) -> Result<(), sqlx::Error> {
    // ---
    for device in devices {
        sqlx::query(
            r#"
            INSERT INTO devices (device_id, label, url, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (device_id) DO UPDATE SET
                label      = EXCLUDED.label,
                url        = EXCLUDED.url,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&device.id)
        .bind(&device.label)
        .bind(&device.url)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Store one poll round in a single transaction. Duplicate
/// `(device_id, timestamp)` pairs are skipped.
pub async fn record_snapshots(pool: &PgPool, snapshots: &[Reading]) -> Result<u64, sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for snapshot in snapshots {
        let result = sqlx::query(
            r#"
            INSERT INTO snapshots (
                id, device_id, timestamp,
                generation, consumption, grid, status, error
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (device_id, timestamp) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&snapshot.device_id)
        .bind(snapshot.timestamp)
        .bind(snapshot.generation)
        .bind(snapshot.consumption)
        .bind(snapshot.grid)
        .bind(snapshot.status.as_str())
        .bind(&snapshot.error)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All readings with `from <= timestamp <= to`, oldest first.
pub async fn fetch_readings(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Reading>, sqlx::Error> {
    // ---
    let rows: Vec<SnapshotRow> = sqlx::query_as(
        r#"
        SELECT s.device_id, d.label, s.timestamp,
               s.generation, s.consumption, s.grid, s.status, s.error
        FROM snapshots s
        JOIN devices d ON d.device_id = s.device_id
        WHERE s.timestamp >= $1 AND s.timestamp <= $2
        ORDER BY s.timestamp ASC, s.device_id ASC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    tracing::debug!("Fetched {} snapshots between {} and {}", rows.len(), from, to);
    Ok(rows.into_iter().map(Reading::from).collect())
}
