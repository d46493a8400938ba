//! vmodem-core: a V.17/V.29 voice-band fax-modem DSP core.
//!
//! The receive pipeline runs power-meter/AGC, DDS downconversion, RRC
//! interpolation, Gardner timing recovery, a T/2 adaptive equalizer,
//! carrier phase tracking, and (for V.17) an 8-state trellis decoder, all
//! driven by a training finite-state machine. The transmit pipeline runs
//! the same stages in reverse. V.29 reuses every stage except the trellis
//! and space map, since it carries no coded redundancy.

pub mod callbacks;
pub mod carrier_tracker;
pub mod channel;
pub mod config;
pub mod constellation;
pub mod dds;
pub mod diagnostics;
pub mod differential;
pub mod equalizer;
pub mod errors;
pub mod gardner;
pub mod logging;
pub mod power_meter;
pub mod rrc;
pub mod sample;
pub mod scrambler;
pub mod space_map;
pub mod training;
pub mod trellis;
pub mod utils;
pub mod v17;
pub mod v29;

pub use config::{BitRate, ModemVariant, RxConfig, TxConfig};
pub use errors::{ConfigError, DspError, ModemError, TrainingFailure};
pub use v17::{V17Receiver, V17Transmitter};
pub use v29::{V29Receiver, V29Transmitter};
