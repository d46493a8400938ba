//! 8-state rate-2/3 convolutional trellis: the encoder used by
//! `v17::tx` and the Viterbi decoder used by `v17::rx`.
//!
//! The encoder is a 3-bit shift register. Two input bits select one of
//! four transitions out of each of the 8 states; the third (redundant)
//! output bit is the feedback parity, giving each state four equally
//! likely next states and guaranteeing a minimum coded distance between
//! diverging paths.

const NUM_STATES: usize = 8;
const NUM_INPUTS: usize = 4;
/// Survivor path traceback depth. 16 symbols is enough for the path
/// metrics to merge with overwhelming probability at any reasonable SNR.
const TRACEBACK_DEPTH: usize = 16;
/// Path-metric decay applied every symbol, bounding accumulated distance
/// so metrics never overflow across an hours-long call while still
/// preserving enough history that a single noise burst doesn't erase it.
const METRIC_DECAY: f32 = 0.98;

/// `(next_state, output_subset)` for every `(state, 2-bit input)` pair.
fn transition(state: u8, input: u8) -> (u8, u8) {
    let q0 = state & 1;
    let q1 = (state >> 1) & 1;
    let q2 = (state >> 2) & 1;
    let y1 = input & 1;
    let y2 = (input >> 1) & 1;

    let y0 = q0 ^ q2; // feedback parity: the redundant trellis bit
    let next_state = y1 | (q0 << 1) | (q1 << 2);
    let subset = y0 | (y1 << 1) | (y2 << 2);
    (next_state, subset)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrellisEncoder {
    state: u8,
}

impl TrellisEncoder {
    pub fn new() -> Self {
        Self { state: 0 }
    }

    pub fn reset(&mut self) {
        self.state = 0;
    }

    /// Encodes 2 input bits into the 3-bit constellation subset index,
    /// advancing the encoder's state.
    pub fn encode(&mut self, input: u8) -> u8 {
        let (next_state, subset) = transition(self.state, input & 0b11);
        self.state = next_state;
        subset
    }
}

/// Fixed-delay Viterbi decoder over the 8-state trellis.
#[derive(Debug, Clone)]
pub struct TrellisDecoder {
    path_metrics: [f32; NUM_STATES],
    survivor_prev_state: Vec<[u8; NUM_STATES]>,
    survivor_input: Vec<[u8; NUM_STATES]>,
    time: usize,
}

impl TrellisDecoder {
    pub fn new() -> Self {
        Self {
            path_metrics: [0.0; NUM_STATES],
            survivor_prev_state: vec![[0u8; NUM_STATES]; TRACEBACK_DEPTH],
            survivor_input: vec![[0u8; NUM_STATES]; TRACEBACK_DEPTH],
            time: 0,
        }
    }

    pub fn reset(&mut self) {
        self.path_metrics = [0.0; NUM_STATES];
        self.time = 0;
    }

    /// Feed the squared distance from the received point to the best
    /// candidate in each of the 8 subsets (from [`crate::space_map`]).
    /// Returns the decoded 2-bit input and the 3-bit subset it produced
    /// from `TRACEBACK_DEPTH` symbols ago once the decoder has filled its
    /// traceback window, else `None` during the initial fill. The subset
    /// lets the caller recover which of the space map's per-subset
    /// candidate points was the one actually sent.
    pub fn step(&mut self, distance_by_subset: [f32; NUM_STATES]) -> Option<(u8, u8)> {
        let mut new_metrics = [f32::MAX; NUM_STATES];
        let mut best_prev = [0u8; NUM_STATES];
        let mut best_input = [0u8; NUM_STATES];

        for state in 0..NUM_STATES as u8 {
            for input in 0..NUM_INPUTS as u8 {
                let (next_state, subset) = transition(state, input);
                let metric =
                    self.path_metrics[state as usize] * METRIC_DECAY + distance_by_subset[subset as usize];
                let slot = &mut new_metrics[next_state as usize];
                if metric < *slot {
                    *slot = metric;
                    best_prev[next_state as usize] = state;
                    best_input[next_state as usize] = input;
                }
            }
        }

        self.path_metrics = new_metrics;
        let idx = self.time % TRACEBACK_DEPTH;
        self.survivor_prev_state[idx] = best_prev;
        self.survivor_input[idx] = best_input;
        self.time += 1;

        if self.time < TRACEBACK_DEPTH {
            return None;
        }

        let mut state = self
            .path_metrics
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i as u8)
            .unwrap_or(0);

        let mut decoded_input = 0u8;
        let mut decoded_prev_state = 0u8;
        for back in 0..TRACEBACK_DEPTH {
            let idx = (self.time - 1 - back) % TRACEBACK_DEPTH;
            let prev = self.survivor_prev_state[idx][state as usize];
            if back == TRACEBACK_DEPTH - 1 {
                decoded_input = self.survivor_input[idx][state as usize];
                decoded_prev_state = prev;
            }
            state = prev;
        }
        let (_, subset) = transition(decoded_prev_state, decoded_input);
        Some((decoded_input, subset))
    }
}

impl Default for TrellisDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noiseless_round_trip_recovers_input_sequence() {
        let mut encoder = TrellisEncoder::new();
        let mut decoder = TrellisDecoder::new();
        let inputs: Vec<u8> = (0..64).map(|i| (i % 4) as u8).collect();
        let mut decoded = Vec::new();

        for &input in &inputs {
            let subset = encoder.encode(input);
            let mut distances = [1.0f32; NUM_STATES];
            distances[subset as usize] = 0.0;
            if let Some((bits, _subset)) = decoder.step(distances) {
                decoded.push(bits);
            }
        }

        assert_eq!(decoded.len(), inputs.len() - TRACEBACK_DEPTH);
        assert_eq!(&decoded[..], &inputs[..decoded.len()]);
    }

    #[test]
    fn decoder_emits_nothing_before_traceback_window_fills() {
        let mut decoder = TrellisDecoder::new();
        for _ in 0..TRACEBACK_DEPTH - 1 {
            assert!(decoder.step([0.0; NUM_STATES]).is_none());
        }
    }

    #[test]
    fn metric_decay_keeps_path_metrics_bounded() {
        let mut encoder = TrellisEncoder::new();
        let mut decoder = TrellisDecoder::new();
        for i in 0..10_000u32 {
            let subset = encoder.encode((i % 4) as u8);
            let mut distances = [5.0f32; NUM_STATES];
            distances[subset as usize] = 0.0;
            decoder.step(distances);
        }
        assert!(decoder.path_metrics.iter().all(|m| m.is_finite() && *m < 1000.0));
    }
}
