//! vmodem error types with granular categories, mirroring the shape of the
//! pipeline stages they guard.

use thiserror::Error;

/// Top-level error type for all vmodem operations.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),
}

/// Errors returned synchronously from `init`/`restart`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unsupported V.17 bit rate: {rate} (valid: 7200, 9600, 12000, 14400)")]
    InvalidBitRate { rate: u32 },

    #[error("unsupported V.29 bit rate: {rate} (valid: 4800, 7200, 9600)")]
    InvalidV29BitRate { rate: u32 },

    #[error("carrier-on cutoff {cutoff_dbm0} dBm0 is out of the usable range [-43, 0]")]
    InvalidCarrierCutoff { cutoff_dbm0: f32 },

    #[error("short_train requested but no prior training snapshot is available")]
    NoShortTrainSnapshot,
}

/// Internal DSP invariant violations. These generally indicate a
/// construction-time misconfiguration rather than a channel condition;
/// the hot path uses `debug_assert!` for the same invariants instead of
/// propagating `Result`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DspError {
    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },

    #[error("buffer capacity {capacity} is not large enough for span {span}")]
    BufferTooSmall { capacity: usize, span: usize },

    #[error("space map region {region} out of range (max {max})")]
    SpaceMapRegionOutOfRange { region: usize, max: usize },
}

/// Surfaced only through the event callback (see [`crate::callbacks`]);
/// never returned synchronously from `receive()` — the sample pump does
/// not fail mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingFailure {
    /// The receiver never saw carrier rise above the configured cutoff.
    NoCarrier,
    /// Gardner/AGC failed to settle within the phase's symbol budget.
    TimingAcquisitionTimeout,
    /// The coarse carrier-rotation jump was never observed.
    CoarseCarrierTimeout,
    /// The equalizer failed to converge within the phase's symbol budget.
    EqualizerTimeout,
    /// The all-ones verification bits did not check out.
    TepVerifyFailed,
}

pub type Result<T> = std::result::Result<T, ModemError>;
