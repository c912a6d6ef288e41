//! Trapezoidal energy integration between two consecutive readings.

use crate::models::Reading;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Energy (kWh) accumulated between two readings of the same device.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyDelta {
    pub generated: f64,
    pub consumed: f64,
    pub grid: f64,
}

/// Integrate power over the interval between `previous` and `current`.
///
/// Readings are kW, so the mean of the two samples times the elapsed hours is
/// kWh. A zero or negative interval (duplicate timestamp, clock skew)
/// contributes nothing.
pub fn integrate(previous: &Reading, current: &Reading) -> EnergyDelta {
    // ---
    let delta_ms = current.timestamp.timestamp_millis() - previous.timestamp.timestamp_millis();
    if delta_ms <= 0 {
        return EnergyDelta::default();
    }

    let hours = delta_ms as f64 / MILLIS_PER_HOUR;
    let trapezoid = |a: f64, b: f64| (a + b) / 2.0 * hours;

    EnergyDelta {
        generated: trapezoid(previous.generation, current.generation),
        consumed: trapezoid(previous.consumption, current.consumption),
        grid: trapezoid(previous.grid, current.grid),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::metrics::test_support::reading_at;

    #[test]
    fn test_one_hour_trapezoid() {
        // ---
        let previous = reading_at("roof", 0, 4.0);
        let current = reading_at("roof", 3_600_000, 6.0);

        let delta = integrate(&previous, &current);
        assert_eq!(delta.generated, 5.0);
    }

    #[test]
    fn test_each_channel_integrated_independently() {
        // ---
        let mut previous = reading_at("roof", 0, 2.0);
        previous.consumption = 1.0;
        previous.grid = -1.0;
        let mut current = reading_at("roof", 1_800_000, 2.0);
        current.consumption = 3.0;
        current.grid = -3.0;

        let delta = integrate(&previous, &current);
        assert_eq!(delta.generated, 1.0);
        assert_eq!(delta.consumed, 1.0);
        assert_eq!(delta.grid, -1.0);
    }

    #[test]
    fn test_duplicate_timestamp_contributes_nothing() {
        // ---
        let previous = reading_at("roof", 60_000, 5.0);
        let current = reading_at("roof", 60_000, 7.0);

        assert_eq!(integrate(&previous, &current), EnergyDelta::default());
    }

    #[test]
    fn test_backwards_clock_contributes_nothing() {
        // ---
        let previous = reading_at("roof", 120_000, 5.0);
        let current = reading_at("roof", 60_000, 7.0);

        assert_eq!(integrate(&previous, &current), EnergyDelta::default());
    }
}
