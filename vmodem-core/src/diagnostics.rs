//! Read-only queries into a receiver's current state: signal power,
//! estimated carrier frequency, equalizer taps, and cumulative symbol
//! timing correction.

use crate::sample::Sample;

/// Snapshot of receiver state, returned by `V17Receiver::diagnostics` /
/// `V29Receiver::diagnostics`.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub signal_power_dbm0: f32,
    pub carrier_frequency_hz: f64,
    pub equalizer_taps: Vec<Sample>,
    pub gardner_total_correction: i64,
}

/// Converts a `Dds` phase rate back into a carrier frequency estimate,
/// the inverse of [`crate::dds::phase_rate_of_frequency`].
pub fn carrier_frequency_hz(phase_rate: i32, sample_rate_hz: f64) -> f64 {
    (phase_rate as f64 / (u32::MAX as f64 + 1.0)) * sample_rate_hz
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::phase_rate_of_frequency;
    use approx::assert_relative_eq;

    #[test]
    fn carrier_frequency_round_trips_through_phase_rate() {
        let rate = phase_rate_of_frequency(1800.0, 8000.0);
        let recovered = carrier_frequency_hz(rate, 8000.0);
        assert_relative_eq!(recovered, 1800.0, epsilon = 0.5);
    }
}
