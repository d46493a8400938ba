//! Shared harness for the integration test suite: round-trip helpers that
//! dispatch across the V.17/V.29 split the way `vmodem-cli` does, since
//! the four pipeline types share no common trait.

use vmodem_core::callbacks::{BitCollector, BitSink, Event};
use vmodem_core::config::{BitRate, ModemVariant, RxConfig, TxConfig};
use vmodem_core::diagnostics::Diagnostics;
use vmodem_core::{V17Receiver, V17Transmitter, V29Receiver, V29Transmitter};

/// Trellis traceback depth, mirrored from `trellis::TRACEBACK_DEPTH`
/// (private to the crate): V.17 needs this many extra symbols pushed
/// through after the real data before the last real symbols are flushed
/// out of the Viterbi decoder.
const TRELLIS_FLUSH_SYMBOLS: u32 = 16;

pub enum AnyTx {
    V17(V17Transmitter),
    V29(V29Transmitter),
}

impl AnyTx {
    pub fn new(config: TxConfig) -> Self {
        match config.bit_rate.variant() {
            ModemVariant::V17 => AnyTx::V17(V17Transmitter::new(config).unwrap()),
            ModemVariant::V29 => AnyTx::V29(V29Transmitter::new(config).unwrap()),
        }
    }

    pub fn training_sequence(&mut self) -> Vec<i16> {
        match self {
            AnyTx::V17(tx) => tx.training_sequence(),
            AnyTx::V29(tx) => tx.training_sequence(),
        }
    }

    pub fn transmit(&mut self, bits: &[u8]) -> Vec<i16> {
        match self {
            AnyTx::V17(tx) => tx.transmit(bits),
            AnyTx::V29(tx) => tx.transmit(bits),
        }
    }

    pub fn restart(&mut self) {
        match self {
            AnyTx::V17(tx) => tx.restart(),
            AnyTx::V29(tx) => tx.restart(),
        }
    }
}

pub enum AnyRx {
    V17(V17Receiver),
    V29(V29Receiver),
}

impl AnyRx {
    pub fn new(config: RxConfig) -> Self {
        match config.bit_rate.variant() {
            ModemVariant::V17 => AnyRx::V17(V17Receiver::new(config).unwrap()),
            ModemVariant::V29 => AnyRx::V29(V29Receiver::new(config).unwrap()),
        }
    }

    pub fn receive(&mut self, samples: &[i16], sink: &mut dyn BitSink) {
        match self {
            AnyRx::V17(rx) => rx.receive(samples, sink),
            AnyRx::V29(rx) => rx.receive(samples, sink),
        }
    }

    pub fn restart(&mut self) {
        match self {
            AnyRx::V17(rx) => rx.restart(),
            AnyRx::V29(rx) => rx.restart(),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            AnyRx::V17(rx) => rx.diagnostics(),
            AnyRx::V29(rx) => rx.diagnostics(),
        }
    }
}

/// Zero-filled flush symbols. V.17's Viterbi decoder only emits a
/// symbol's bits `TRELLIS_FLUSH_SYMBOLS` symbols after it entered the
/// decoder, so the real data's tail never comes out unless more symbols
/// follow it. V.29 has no such delay and needs none.
pub fn flush_bits(bit_rate: BitRate) -> Vec<u8> {
    if bit_rate.is_trellis_coded() {
        vec![0u8; (TRELLIS_FLUSH_SYMBOLS * bit_rate.bits_per_symbol()) as usize]
    } else {
        Vec::new()
    }
}

pub struct RoundTripResult {
    pub bits: Vec<u8>,
    pub events: Vec<Event>,
    pub diagnostics: Diagnostics,
}

/// Runs training + `data_bits` + enough flush symbols through a fresh
/// transmitter/receiver pair over an ideal (lossless, unmodified) channel.
pub fn round_trip(bit_rate: BitRate, data_bits: &[u8]) -> RoundTripResult {
    round_trip_with_channel(bit_rate, data_bits, |samples| samples)
}

/// Same as [`round_trip`] but applies `channel` to the line signal before
/// it reaches the receiver, so callers can layer in noise, attenuation,
/// or resampling.
pub fn round_trip_with_channel(
    bit_rate: BitRate,
    data_bits: &[u8],
    channel: impl FnOnce(Vec<i16>) -> Vec<i16>,
) -> RoundTripResult {
    let mut tx = AnyTx::new(TxConfig {
        bit_rate,
        short_train: false,
        log: None,
    });

    let mut samples = tx.training_sequence();
    samples.extend(tx.transmit(data_bits));
    samples.extend(tx.transmit(&flush_bits(bit_rate)));

    let samples = channel(samples);

    let mut rx = AnyRx::new(RxConfig {
        bit_rate,
        ..RxConfig::default()
    });
    let mut collector = BitCollector::default();
    rx.receive(&samples, &mut collector);

    let diagnostics = rx.diagnostics();
    RoundTripResult {
        bits: collector.bits,
        events: collector.events,
        diagnostics,
    }
}

/// Deterministic pseudo-random bits for tests that don't care about the
/// exact pattern, just that it isn't a fixed-point sequence for the
/// scrambler/trellis to trivially lock onto.
pub fn pseudo_random_bits(seed: u64, n: usize) -> Vec<u8> {
    let mut x = seed | 1;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x & 1) as u8
        })
        .collect()
}

/// Every V.17 and V.29 bit rate, for tests that sweep the full rate set.
pub fn all_bit_rates() -> Vec<BitRate> {
    vec![
        BitRate::V17_14400,
        BitRate::V17_12000,
        BitRate::V17_9600,
        BitRate::V17_7200,
        BitRate::V29_9600,
        BitRate::V29_7200,
        BitRate::V29_4800,
    ]
}

/// Linearly resamples a line signal to simulate a transmit/receive
/// symbol-clock mismatch of `ratio` (e.g. `1.0001` for a 0.01% offset).
pub fn resample(samples: &[i16], ratio: f64) -> Vec<i16> {
    let out_len = (samples.len() as f64 / ratio) as usize;
    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos as usize;
            if idx + 1 >= samples.len() {
                return *samples.last().unwrap_or(&0);
            }
            let frac = src_pos - idx as f64;
            let a = samples[idx] as f64;
            let b = samples[idx + 1] as f64;
            (a + (b - a) * frac) as i16
        })
        .collect()
}
