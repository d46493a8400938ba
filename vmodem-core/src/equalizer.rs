//! T/2-spaced adaptive complex LMS equalizer.
//!
//! The tap-spaced history is a power-of-two ring buffer so indexing is a
//! mask instead of a modulo; `num_taps` need not itself be a power of two.

use crate::sample::Sample;

#[derive(Debug, Clone)]
pub struct Equalizer {
    taps: Vec<Sample>,
    history: Vec<Sample>,
    mask: usize,
    put: usize,
    delta: f32,
}

impl Equalizer {
    pub fn new(num_taps: usize, delta: f32) -> Self {
        let buf_len = num_taps.next_power_of_two().max(2);
        Self {
            taps: vec![Sample::new(0.0, 0.0); num_taps],
            history: vec![Sample::new(0.0, 0.0); buf_len],
            mask: buf_len - 1,
            put: 0,
            delta,
        }
    }

    pub fn set_delta(&mut self, delta: f32) {
        self.delta = delta;
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Push one new T/2-spaced sample into the tap history.
    pub fn push(&mut self, sample: Sample) {
        self.history[self.put & self.mask] = sample;
        self.put = self.put.wrapping_add(1);
    }

    fn tap_index(&self, i: usize) -> usize {
        (self.put.wrapping_sub(1).wrapping_sub(i)) & self.mask
    }

    /// Current filtered output given the tap weights and sample history.
    pub fn output(&self) -> Sample {
        let mut acc = Sample::new(0.0, 0.0);
        for (i, &tap) in self.taps.iter().enumerate() {
            acc += tap * self.history[self.tap_index(i)];
        }
        acc
    }

    /// Complex LMS update: `w_i += delta * conj(x_i) * error`, where
    /// `error = desired - output` is supplied by the caller (the training
    /// reference symbol, or the sliced decision, minus `output()`).
    pub fn adapt(&mut self, error: Sample) {
        for (i, tap) in self.taps.iter_mut().enumerate() {
            let idx = self.tap_index(i);
            *tap += self.history[idx].conj() * error * self.delta;
        }
    }

    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.taps.clone()
    }

    pub fn restore(&mut self, taps: &[Sample]) {
        debug_assert_eq!(taps.len(), self.taps.len());
        self.taps.copy_from_slice(taps);
    }

    pub fn reset_taps(&mut self) {
        for tap in self.taps.iter_mut() {
            *tap = Sample::new(0.0, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn converges_to_invert_a_static_complex_gain() {
        let channel_gain = Sample::new(0.5, 0.2);
        let mut eq = Equalizer::new(7, 0.05);
        let symbols = [
            Sample::new(1.0, 1.0),
            Sample::new(-1.0, 1.0),
            Sample::new(-1.0, -1.0),
            Sample::new(1.0, -1.0),
        ];

        for i in 0..2000 {
            let tx = symbols[i % symbols.len()];
            let rx = tx * channel_gain;
            eq.push(rx);
            let out = eq.output();
            let error = tx - out;
            eq.adapt(error);
        }

        for i in 0..symbols.len() {
            let tx = symbols[i];
            let rx = tx * channel_gain;
            eq.push(rx);
            let out = eq.output();
            assert_relative_eq!(out.re, tx.re, epsilon = 0.2);
            assert_relative_eq!(out.im, tx.im, epsilon = 0.2);
        }
    }

    #[test]
    fn snapshot_and_restore_round_trip() {
        let mut eq = Equalizer::new(7, 0.05);
        eq.push(Sample::new(1.0, 0.0));
        eq.adapt(Sample::new(0.1, -0.1));
        let snap = eq.snapshot();

        let mut eq2 = Equalizer::new(7, 0.05);
        eq2.restore(&snap);
        assert_eq!(eq2.snapshot(), snap);
    }
}
