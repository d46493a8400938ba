//! Shared sample types and small power/level helpers used throughout the
//! pipeline.

use num_complex::Complex32;

/// A single complex baseband sample, T (symbol-rate) or T/2 spaced
/// depending on the stage producing it.
pub type Sample = Complex32;

/// Convert a linear power ratio (relative to a 600-ohm, 0 dBm0 reference)
/// to dBm0.
pub fn dbm0_of(power: f32) -> f32 {
    if power <= 0.0 {
        f32::NEG_INFINITY
    } else {
        10.0 * power.log10()
    }
}

/// Convert a linear amplitude ratio to dB.
pub fn db_of(ratio: f32) -> f32 {
    if ratio <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * ratio.log10()
    }
}
