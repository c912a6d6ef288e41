//! Data models for the solar telemetry pipeline.
//!
//! All power values are kilowatts. Grid power is signed: negative means the
//! property is exporting to the grid, positive means it is importing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Ok,
    Error,
}

impl ReadingStatus {
    // ---
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Ok => "ok",
            ReadingStatus::Error => "error",
        }
    }

    /// Anything other than `ok` counts as offline.
    pub fn from_db(value: &str) -> Self {
        if value == "ok" {
            ReadingStatus::Ok
        } else {
            ReadingStatus::Error
        }
    }
}

/// Snapshot row as returned by the range query.
#[derive(Debug, sqlx::FromRow)]
pub struct SnapshotRow {
    // ---
    pub device_id: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub generation: f64,
    pub consumption: f64,
    pub grid: f64,
    pub status: String,
    pub error: Option<String>,
}

/// One polled measurement for one device, the input of the history aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    pub device_id: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub generation: f64,
    pub consumption: f64,
    pub grid: f64,
    pub status: ReadingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reading {
    // ---
    pub fn is_online(&self) -> bool {
        self.status == ReadingStatus::Ok
    }
}

impl From<SnapshotRow> for Reading {
    fn from(row: SnapshotRow) -> Self {
        // ---
        Reading {
            device_id: row.device_id,
            label: row.label,
            timestamp: row.timestamp,
            generation: row.generation,
            consumption: row.consumption,
            grid: row.grid,
            status: ReadingStatus::from_db(&row.status),
            error: row.error,
        }
    }
}

/// Live dashboard payload returned by `GET /api/power`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerDashboard {
    // ---
    pub property: String,
    pub updated_at: DateTime<Utc>,
    pub devices: Vec<Reading>,
    pub combined: Reading,
}

/// Requested window echoed back in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    // ---
    pub energy_generated: f64,
    pub energy_consumed: f64,
    pub energy_exported: f64,
    pub energy_imported: f64,
    pub energy_net: f64,
    pub average_generation: f64,
    pub peak_generation: f64,
    pub uptime_percent: f64,
}

/// One minute of the combined timeline, averaged over every sample in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub timestamp: DateTime<Utc>,
    pub generation: f64,
    pub consumption: f64,
    pub grid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    // ---
    pub device_id: String,
    pub label: String,
    pub uptime_percent: f64,
    pub online_samples: u64,
    pub downtime_samples: u64,
    pub total_samples: u64,
    pub average_generation: f64,
    pub peak_generation: f64,
    pub energy_generated: f64,
    pub energy_consumed: f64,
    pub energy_grid: f64,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Response body of `GET /api/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSummary {
    pub range: SummaryRange,
    pub totals: SummaryTotals,
    pub timeline: Vec<TimelinePoint>,
    pub devices: Vec<DeviceMetrics>,
}
