//! Telemetry sampling and statistical aggregation over receiver diagnostics.

use crate::logging::{StatSummary, TelemetryEvent};
use chrono::Utc;
use std::time::Instant;
use vmodem_core::diagnostics::Diagnostics;

/// Accumulates periodic `Diagnostics` samples and computes run statistics.
pub struct TelemetryAggregator {
    signal_power_samples: Vec<f64>,
    carrier_frequency_samples: Vec<f64>,

    last_sample_time: Instant,
    total_bits_decoded: usize,
    last_gardner_correction: i64,

    sample_interval_secs: f64,
}

impl TelemetryAggregator {
    pub fn new(sample_interval_secs: f64) -> Self {
        Self {
            signal_power_samples: Vec::new(),
            carrier_frequency_samples: Vec::new(),
            last_sample_time: Instant::now(),
            total_bits_decoded: 0,
            last_gardner_correction: 0,
            sample_interval_secs,
        }
    }

    pub fn should_sample(&self) -> bool {
        self.last_sample_time.elapsed().as_secs_f64() >= self.sample_interval_secs
    }

    /// Folds in a new diagnostics reading and, if the sample interval has
    /// elapsed, returns a telemetry event and resets the timer.
    pub fn sample(&mut self, diagnostics: &Diagnostics, bits_decoded: usize) -> Option<TelemetryEvent> {
        self.total_bits_decoded = bits_decoded;
        self.last_gardner_correction = diagnostics.gardner_total_correction;
        self.signal_power_samples.push(diagnostics.signal_power_dbm0 as f64);
        self.carrier_frequency_samples.push(diagnostics.carrier_frequency_hz);

        if !self.should_sample() {
            return None;
        }

        let event = TelemetryEvent {
            timestamp: Utc::now(),
            signal_power_dbm0: diagnostics.signal_power_dbm0,
            carrier_frequency_hz: diagnostics.carrier_frequency_hz,
            gardner_total_correction: diagnostics.gardner_total_correction,
            bits_decoded: self.total_bits_decoded,
        };

        self.last_sample_time = Instant::now();
        Some(event)
    }

    /// Computes a statistical summary for (signal power, carrier frequency).
    pub fn compute_statistics(&self) -> (StatSummary, StatSummary) {
        (
            Self::compute_stat_summary(&self.signal_power_samples),
            Self::compute_stat_summary(&self.carrier_frequency_samples),
        )
    }

    fn compute_stat_summary(samples: &[f64]) -> StatSummary {
        if samples.is_empty() {
            return StatSummary {
                mean: 0.0,
                stddev: 0.0,
                min: 0.0,
                max: 0.0,
                samples: 0,
            };
        }

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        let stddev = variance.sqrt();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        StatSummary {
            mean,
            stddev,
            min,
            max,
            samples: samples.len(),
        }
    }

    pub fn total_bits_decoded(&self) -> usize {
        self.total_bits_decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(power: f32, freq: f64) -> Diagnostics {
        Diagnostics {
            signal_power_dbm0: power,
            carrier_frequency_hz: freq,
            equalizer_taps: Vec::new(),
            gardner_total_correction: 0,
        }
    }

    #[test]
    fn statistics_reflect_accumulated_samples() {
        let mut agg = TelemetryAggregator::new(0.0);
        agg.sample(&diag(-20.0, 1800.0), 10);
        agg.sample(&diag(-22.0, 1800.0), 20);

        let (power, freq) = agg.compute_statistics();
        assert_eq!(power.samples, 2);
        assert_eq!(freq.mean, 1800.0);
        assert_eq!(agg.total_bits_decoded(), 20);
    }
}
