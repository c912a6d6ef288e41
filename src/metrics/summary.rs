//! Reduction of finished per-device metrics and the timeline into totals.

use super::accumulator::percent;
use crate::models::{DeviceMetrics, SummaryTotals, TimelinePoint};

/// Combine per-device results into property-wide totals.
///
/// Grid energy follows the reading sign convention: a negative device balance
/// is export, a positive one is import. Export and import are split per device
/// before summing, so they only add up to `|energy_net|` when every device
/// leans the same way.
pub fn compose_totals(devices: &[DeviceMetrics], timeline: &[TimelinePoint]) -> SummaryTotals {
    // ---
    let total_samples: u64 = devices.iter().map(|d| d.total_samples).sum();
    let online_samples: u64 = devices.iter().map(|d| d.online_samples).sum();

    let weighted_generation: f64 = devices
        .iter()
        .map(|d| d.average_generation * d.total_samples as f64)
        .sum();

    // Peak of the averaged timeline, not of any single inverter
    let peak_generation = timeline
        .iter()
        .fold(0.0_f64, |peak, point| peak.max(point.generation));

    SummaryTotals {
        energy_generated: devices.iter().map(|d| d.energy_generated).sum(),
        energy_consumed: devices.iter().map(|d| d.energy_consumed).sum(),
        energy_exported: devices.iter().map(|d| (-d.energy_grid).max(0.0)).sum(),
        energy_imported: devices.iter().map(|d| d.energy_grid.max(0.0)).sum(),
        energy_net: devices.iter().map(|d| d.energy_grid).sum(),
        average_generation: if total_samples == 0 {
            0.0
        } else {
            weighted_generation / total_samples as f64
        },
        peak_generation,
        uptime_percent: percent(online_samples, total_samples),
    }
}
