//! One-minute buckets across all devices for the history chart.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Reading, TimelinePoint};

const BUCKET_MS: i64 = 60_000;

#[derive(Debug, Default, Clone, Copy)]
struct BucketSum {
    generation: f64,
    consumption: f64,
    grid: f64,
    samples: u32,
}

/// Sparse minute buckets keyed by bucket start. Empty minutes never appear.
#[derive(Debug, Default)]
pub struct Timeline {
    buckets: BTreeMap<DateTime<Utc>, BucketSum>,
}

impl Timeline {
    // ---
    pub fn push(&mut self, reading: &Reading) {
        // ---
        let start_ms = reading.timestamp.timestamp_millis().div_euclid(BUCKET_MS) * BUCKET_MS;
        let Some(start) = DateTime::from_timestamp_millis(start_ms) else {
            tracing::warn!(
                "Skipping {} reading at {} outside the bucket range",
                reading.device_id,
                reading.timestamp
            );
            return;
        };

        let bucket = self.buckets.entry(start).or_default();
        bucket.generation += reading.generation;
        bucket.consumption += reading.consumption;
        bucket.grid += reading.grid;
        bucket.samples += 1;
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Average each bucket over its samples, ascending by time.
    ///
    /// A mean rather than a sum, so two inverters reporting in the same minute
    /// do not double the charted power.
    pub fn finish(self) -> Vec<TimelinePoint> {
        // ---
        self.buckets
            .into_iter()
            .map(|(timestamp, sum)| {
                let n = f64::from(sum.samples);
                TimelinePoint {
                    timestamp,
                    generation: sum.generation / n,
                    consumption: sum.consumption / n,
                    grid: sum.grid / n,
                }
            })
            .collect()
    }
}
