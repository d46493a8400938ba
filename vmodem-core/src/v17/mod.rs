//! V.17 trellis-coded QAM: 2400 baud, carrier at 1800 Hz, rate-2/3
//! convolutional trellis on the two differentially-coded quadrant bits.

pub mod rx;
pub mod tx;

pub use rx::V17Receiver;
pub use tx::V17Transmitter;

/// Line sample rate the whole pipeline runs at: 8 kHz linear PCM, the
/// external interface's contracted input rate.
pub const SAMPLE_RATE_HZ: f64 = 8000.0;
/// Symbol (baud) rate, fixed for every V.17 bit rate.
pub const BAUD_RATE_HZ: f64 = 2400.0;
pub const CARRIER_FREQ_HZ: f64 = 1800.0;
/// Nominal (non-integral) raw samples per symbol: 8000/2400 = 10/3. Both
/// the transmitter's zero-stuff cadence and the receiver's T/2 pick-off
/// track the fractional remainder explicitly rather than assuming an
/// integral oversample; this is only a capacity-hint rounding.
pub const NOMINAL_SAMPLES_PER_SYMBOL: usize = 3;

pub(crate) fn raw_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}
