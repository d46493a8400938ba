//! Single-pole IIR signal power estimator with carrier-present hysteresis,
//! plus the one-shot AGC gain derived from it.

use crate::sample::{dbm0_of, Sample};

/// Time constant of the power-smoothing IIR, expressed as the fraction of
/// the new sample's power retained each update. Small enough to average
/// over several symbols, large enough to track level changes within a
/// training sequence.
const POWER_ALPHA: f32 = 1.0 / 32.0;

/// Nominal full-scale receive level used to derive the AGC scale factor;
/// matches the reference ITU-T test signal level.
const AGC_TARGET_DBM0: f32 = -13.0;

#[derive(Debug, Clone)]
pub struct PowerMeter {
    /// Smoothed instantaneous power estimate (linear, normalized to a
    /// full-scale sample of magnitude 1.0 == 0 dBm0).
    power: f32,
    carrier_on_cutoff: f32,
    carrier_off_cutoff: f32,
    carrier_present: bool,
}

impl PowerMeter {
    pub fn new(carrier_on_cutoff_dbm0: f32, carrier_off_hysteresis_db: f32) -> Self {
        Self {
            power: 0.0,
            carrier_on_cutoff: carrier_on_cutoff_dbm0,
            carrier_off_cutoff: carrier_on_cutoff_dbm0 - carrier_off_hysteresis_db,
            carrier_present: false,
        }
    }

    /// Feed one input sample (real-valued line signal). Returns the
    /// carrier-present transition, if any, that just occurred.
    pub fn update(&mut self, sample: f32) -> Option<bool> {
        let instantaneous = sample * sample;
        self.power += (instantaneous - self.power) * POWER_ALPHA;

        let level = dbm0_of(self.power);
        if !self.carrier_present && level > self.carrier_on_cutoff {
            self.carrier_present = true;
            Some(true)
        } else if self.carrier_present && level < self.carrier_off_cutoff {
            self.carrier_present = false;
            Some(false)
        } else {
            None
        }
    }

    pub fn signal_power_dbm0(&self) -> f32 {
        dbm0_of(self.power)
    }

    pub fn carrier_present(&self) -> bool {
        self.carrier_present
    }

    /// Linear scale factor that would bring the current signal power up
    /// to the nominal AGC target level. Applied once at the start of
    /// training and then held fixed for the rest of the call.
    pub fn agc_scaling(&self) -> f32 {
        if self.power <= 0.0 {
            1.0
        } else {
            let target_power = 10f32.powf(AGC_TARGET_DBM0 / 10.0);
            (target_power / self.power).sqrt()
        }
    }

    pub fn reset(&mut self) {
        self.power = 0.0;
        self.carrier_present = false;
    }
}

/// Scales a complex baseband sample by a fixed AGC gain.
pub fn apply_agc(sample: Sample, scaling: f32) -> Sample {
    sample * scaling
}
