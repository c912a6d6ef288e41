//! Per-device running aggregate for one history query.

use chrono::{DateTime, Utc};

use super::integrator::integrate;
use crate::models::{DeviceMetrics, Reading};

// ---

#[derive(Debug, Clone)]
pub struct DeviceAccumulator {
    // ---
    device_id: String,
    label: String,
    total_samples: u64,
    online_samples: u64,
    sum_generation: f64,
    sum_consumption: f64,
    sum_grid: f64,
    peak_generation: f64,
    energy_generated: f64,
    energy_consumed: f64,
    energy_grid: f64,
    previous: Option<Reading>,
    last_seen: Option<DateTime<Utc>>,
}

impl DeviceAccumulator {
    // ---
    pub fn new(device_id: &str, label: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            label: label.to_string(),
            total_samples: 0,
            online_samples: 0,
            sum_generation: 0.0,
            sum_consumption: 0.0,
            sum_grid: 0.0,
            peak_generation: 0.0,
            energy_generated: 0.0,
            energy_consumed: 0.0,
            energy_grid: 0.0,
            previous: None,
            last_seen: None,
        }
    }

    /// Fold one reading into the aggregate.
    ///
    /// Readings must arrive in timestamp order for this device. Offline
    /// readings still count towards the power sums, so outages pull the
    /// average down.
    pub fn push(&mut self, reading: &Reading) {
        // ---
        self.total_samples += 1;
        if reading.is_online() {
            self.online_samples += 1;
        }

        self.sum_generation += reading.generation;
        self.sum_consumption += reading.consumption;
        self.sum_grid += reading.grid;
        self.peak_generation = self.peak_generation.max(reading.generation);
        self.last_seen = Some(reading.timestamp);

        if let Some(previous) = &self.previous {
            let delta = integrate(previous, reading);
            self.energy_generated += delta.generated;
            self.energy_consumed += delta.consumed;
            self.energy_grid += delta.grid;
        }
        self.previous = Some(reading.clone());
    }

    pub fn finish(self) -> DeviceMetrics {
        // ---
        DeviceMetrics {
            uptime_percent: percent(self.online_samples, self.total_samples),
            online_samples: self.online_samples,
            downtime_samples: self.total_samples - self.online_samples,
            total_samples: self.total_samples,
            average_generation: mean(self.sum_generation, self.total_samples),
            peak_generation: self.peak_generation,
            energy_generated: self.energy_generated,
            energy_consumed: self.energy_consumed,
            energy_grid: self.energy_grid,
            last_seen: self.last_seen,
            device_id: self.device_id,
            label: self.label,
        }
    }
}

pub(super) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
