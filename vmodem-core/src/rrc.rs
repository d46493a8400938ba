//! Root-raised-cosine pulse shaping: a fractionally-spaced polyphase
//! interpolator on receive, and a generic complex one-pole smoothing
//! filter used by the power meter and diagnostics.

use std::f64::consts::PI;

use crate::sample::Sample;

/// Conceptual ×3 upsample: one of three polyphase sub-phases per raw
/// input sample, together spanning one input-sample period (1/24000 s
/// each, against an 8 kHz input).
pub const FILTER_STEPS: usize = 3;
/// Taps per polyphase branch (3×27 = 81-tap logical RRC at 24 kHz).
const TAPS_PER_STEP: usize = 27;
const ROLLOFF: f64 = 0.5;

/// Polyphase RRC interpolator, structured as `FILTER_STEPS` phases of
/// `TAPS_PER_STEP` taps each — the receive-side half of a matched RRC
/// pair, taking the raw passband line samples and producing a phase
/// position selectable at sub-sample resolution for Gardner tracking.
#[derive(Debug, Clone)]
pub struct RrcInterpolator {
    /// `FILTER_STEPS` rows of `TAPS_PER_STEP` coefficients, one row per
    /// fractional sample offset.
    phases: Vec<[f32; TAPS_PER_STEP]>,
    history: Vec<Sample>,
    put: usize,
}

impl RrcInterpolator {
    pub fn new(baud_rate: f64, sample_rate: f64) -> Self {
        let phases = design_polyphase_rrc(baud_rate, sample_rate);
        Self {
            phases,
            history: vec![Sample::new(0.0, 0.0); TAPS_PER_STEP],
            put: 0,
        }
    }

    /// Push one new baseband input sample into the filter's history.
    pub fn push(&mut self, sample: Sample) {
        self.history[self.put] = sample;
        self.put = (self.put + 1) % TAPS_PER_STEP;
    }

    /// Compute the interpolated output for fractional step `step`
    /// (`0..FILTER_STEPS`) against the samples currently in history.
    pub fn interpolate(&self, step: usize) -> Sample {
        let coeffs = &self.phases[step % FILTER_STEPS];
        let mut acc = Sample::new(0.0, 0.0);
        for (i, &c) in coeffs.iter().enumerate() {
            let idx = (self.put + i) % TAPS_PER_STEP;
            acc += self.history[idx] * c;
        }
        acc
    }
}

/// Design a unit-energy RRC filter at `FILTER_STEPS` sub-sample phases
/// covering one input sample period, for the given baud/sample rate pair.
fn design_polyphase_rrc(baud_rate: f64, sample_rate: f64) -> Vec<[f32; TAPS_PER_STEP]> {
    let ts = 1.0 / baud_rate;
    let step_period = 1.0 / (sample_rate * FILTER_STEPS as f64);
    let half_span = (TAPS_PER_STEP / 2) as f64;

    let mut phases = Vec::with_capacity(FILTER_STEPS);
    for step in 0..FILTER_STEPS {
        let mut row = [0.0f32; TAPS_PER_STEP];
        let mut energy = 0.0f64;
        for (i, coeff) in row.iter_mut().enumerate() {
            let t = (i as f64 - half_span) / sample_rate + (step as f64) * step_period;
            let v = rrc_impulse(t, ts, ROLLOFF);
            *coeff = v as f32;
            energy += v * v;
        }
        if energy > 1e-12 {
            let scale = (1.0 / energy.sqrt()) as f32;
            for coeff in row.iter_mut() {
                *coeff *= scale;
            }
        }
        phases.push(row);
    }
    phases
}

fn rrc_impulse(t: f64, ts: f64, rolloff: f64) -> f64 {
    let t_norm = t / ts;
    if t_norm.abs() < 1e-10 {
        return 1.0 - rolloff + 4.0 * rolloff / PI;
    }
    if (t_norm.abs() - 1.0 / (4.0 * rolloff)).abs() < 1e-10 {
        let sqrt2 = std::f64::consts::SQRT_2;
        return rolloff / sqrt2
            * ((1.0 + 2.0 / PI) * (PI / 4.0).sin() + (1.0 - 2.0 / PI) * (PI / 4.0).cos());
    }
    let pi_t = PI * t_norm;
    let four_alpha_t = 4.0 * rolloff * t_norm;
    let numerator = (pi_t * rolloff).cos() + pi_t.sin() / four_alpha_t;
    let denominator = pi_t * (1.0 - four_alpha_t * four_alpha_t);
    if denominator.abs() > 1e-10 {
        numerator / denominator
    } else {
        0.0
    }
}

/// A generic complex one-pole low-pass filter, independently smoothing
/// the real and imaginary channels. Used wherever a cheap IIR smoother is
/// needed outside the matched-filter path (e.g. diagnostics averaging).
#[derive(Debug, Clone, Copy)]
pub struct ComplexIirFilter {
    alpha: f32,
    state: Sample,
}

impl ComplexIirFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            state: Sample::new(0.0, 0.0),
        }
    }

    pub fn step(&mut self, input: Sample) -> Sample {
        self.state += (input - self.state) * self.alpha;
        self.state
    }

    pub fn value(&self) -> Sample {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn polyphase_rows_are_unit_energy() {
        let interp = RrcInterpolator::new(2400.0, 8000.0);
        for row in &interp.phases {
            let energy: f32 = row.iter().map(|&x| x * x).sum();
            assert_relative_eq!(energy, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn impulse_response_peaks_near_center() {
        let mut interp = RrcInterpolator::new(2400.0, 8000.0);
        let zero = Sample::new(0.0, 0.0);
        let one = Sample::new(1.0, 0.0);
        for _ in 0..(TAPS_PER_STEP / 2) {
            interp.push(zero);
        }
        interp.push(one);
        let center = interp.interpolate(0);
        for _ in 0..(TAPS_PER_STEP / 2) {
            interp.push(zero);
        }
        let later = interp.interpolate(0);
        assert!(center.norm() > later.norm());
    }

    #[test]
    fn complex_iir_tracks_constant_input() {
        let mut f = ComplexIirFilter::new(0.1);
        let input = Sample::new(1.0, -0.5);
        for _ in 0..200 {
            f.step(input);
        }
        assert_relative_eq!(f.value().re, 1.0, epsilon = 1e-3);
        assert_relative_eq!(f.value().im, -0.5, epsilon = 1e-3);
    }
}
