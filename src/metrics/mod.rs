//! Historical aggregation over stored inverter readings.
//!
//! Gateway for the aggregation engine (EMBP): the submodules stay private and
//! callers only see [`summarize`]. One call makes a single pass over the rows,
//! feeding per-device accumulators and the minute timeline together, then
//! reduces both into a [`HistoricalSummary`]. All state is call-scoped.

use std::collections::HashMap;

use crate::models::{HistoricalSummary, Reading, SummaryRange};

mod accumulator;
mod integrator;
mod summary;
mod timeline;

use accumulator::DeviceAccumulator;
use timeline::Timeline;

// ---

/// Summarize `readings` for the given range.
///
/// Rows are stably re-sorted by timestamp first so each device is integrated
/// in order even if the store did not sort them. Devices are reported in
/// first-seen order. No rows gives an all-zero summary.
pub fn summarize(range: SummaryRange, readings: &[Reading]) -> HistoricalSummary {
    // ---
    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accumulators: Vec<DeviceAccumulator> = Vec::new();
    let mut timeline = Timeline::default();

    for reading in ordered {
        let slot = *index.entry(reading.device_id.as_str()).or_insert_with(|| {
            accumulators.push(DeviceAccumulator::new(&reading.device_id, &reading.label));
            accumulators.len() - 1
        });
        accumulators[slot].push(reading);
        timeline.push(reading);
    }

    tracing::debug!(
        "Aggregated {} readings into {} devices and {} minute buckets for '{}'",
        readings.len(),
        accumulators.len(),
        timeline.len(),
        range.label
    );

    let devices: Vec<_> = accumulators.into_iter().map(DeviceAccumulator::finish).collect();
    let timeline = timeline.finish();
    let totals = summary::compose_totals(&devices, &timeline);

    HistoricalSummary {
        range,
        totals,
        timeline,
        devices,
    }
}


#[cfg(test)]
mod tests {
    // ---
    use super::test_support::{offline_at, reading_at};
    use super::*;
    use crate::models::SummaryTotals;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const HOUR: i64 = 3_600_000;

    fn range() -> SummaryRange {
        SummaryRange {
            from: Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap(),
            label: "Last 24 hours".to_string(),
        }
    }

    fn with_grid(mut reading: Reading, consumption: f64, grid: f64) -> Reading {
        reading.consumption = consumption;
        reading.grid = grid;
        reading
    }

    fn two_device_day() -> Vec<Reading> {
        // ---
        vec![
            with_grid(reading_at("house", 0, 4.0), 1.0, -3.0),
            with_grid(reading_at("flat", 0, 2.0), 2.0, 0.0),
            with_grid(reading_at("house", HOUR, 6.0), 1.0, -5.0),
            with_grid(reading_at("flat", HOUR, 2.0), 3.0, 1.0),
            offline_at("flat", 2 * HOUR),
        ]
    }

    #[test]
    fn test_empty_input_is_zeroed_summary() {
        // ---
        let summary = summarize(range(), &[]);

        assert_eq!(summary.totals, SummaryTotals::default());
        assert!(summary.timeline.is_empty());
        assert!(summary.devices.is_empty());
        assert_eq!(summary.range, range());
    }

    #[test]
    fn test_single_reading_has_no_energy() {
        // ---
        let summary = summarize(range(), &[reading_at("house", 0, 8.0)]);

        assert_eq!(summary.totals.energy_generated, 0.0);
        assert_eq!(summary.devices[0].energy_generated, 0.0);
        assert_eq!(summary.totals.peak_generation, 8.0);
    }

    #[test]
    fn test_one_hour_of_generation() {
        // ---
        let readings = vec![reading_at("house", 0, 4.0), reading_at("house", HOUR, 6.0)];
        let summary = summarize(range(), &readings);

        assert_eq!(summary.totals.energy_generated, 5.0);
        assert_eq!(summary.devices[0].energy_generated, 5.0);
    }

    #[test]
    fn test_two_device_totals() {
        // ---
        let summary = summarize(range(), &two_device_day());

        let ids: Vec<&str> = summary.devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["house", "flat"]);

        let house = &summary.devices[0];
        assert_eq!(house.energy_generated, 5.0);
        assert_eq!(house.energy_grid, -4.0);

        // flat: 2 kW for an hour, then 1 kW average on the way down to the outage
        let flat = &summary.devices[1];
        assert_eq!(flat.energy_generated, 3.0);
        assert_eq!(flat.energy_consumed, 4.0);
        assert_eq!(flat.energy_grid, 1.0);
        assert_eq!(flat.total_samples, 3);
        assert_eq!(flat.downtime_samples, 1);

        assert_eq!(summary.totals.energy_generated, 8.0);
        assert_eq!(summary.totals.energy_exported, 4.0);
        assert_eq!(summary.totals.energy_imported, 1.0);
        assert_eq!(summary.totals.energy_net, -3.0);
        assert_eq!(summary.totals.uptime_percent, 80.0);

        // (4 + 6 + 2 + 2 + 0) / 5 samples
        assert!((summary.totals.average_generation - 2.8).abs() < 1e-12);

        // Minute buckets average both devices: (6 + 2) / 2 at the one-hour mark
        assert_eq!(summary.timeline.len(), 3);
        assert_eq!(summary.timeline[0].generation, 3.0);
        assert_eq!(summary.timeline[1].generation, 4.0);
        assert_eq!(summary.totals.peak_generation, 4.0);
    }

    #[test]
    fn test_device_energy_sums_to_total() {
        // ---
        let summary = summarize(range(), &two_device_day());
        let sum: f64 = summary.devices.iter().map(|d| d.energy_generated).sum();

        assert!((sum - summary.totals.energy_generated).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_rows_are_integrated_in_time_order() {
        // ---
        let mut readings = two_device_day();
        readings.reverse();

        let sorted = summarize(range(), &two_device_day());
        let shuffled = summarize(range(), &readings);

        assert_eq!(sorted.totals.energy_generated, shuffled.totals.energy_generated);
        assert_eq!(sorted.timeline, shuffled.timeline);
        assert!(shuffled.devices.iter().all(|d| d.energy_generated >= 0.0));
    }

    #[test]
    fn test_summaries_are_repeatable() {
        // ---
        let readings = two_device_day();
        assert_eq!(summarize(range(), &readings), summarize(range(), &readings));
    }

    #[test]
    fn test_non_negative_generation_gives_non_negative_energy() {
        // ---
        let readings: Vec<Reading> = (0..50)
            .map(|i| reading_at("house", i * 37_000, ((i * 7) % 11) as f64 * 0.3))
            .collect();

        let summary = summarize(range(), &readings);
        assert!(summary.totals.energy_generated >= 0.0);
        assert!(summary.totals.energy_generated > 0.0);
    }
}
