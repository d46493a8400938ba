//! Configuration types for the vmodem receive/transmit pipelines.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::logging::LogConfig;

/// Which ITU-T recommendation a receiver/transmitter instance implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModemVariant {
    V17,
    V29,
}

/// Line bit rate. All rates run at the fixed 2400 baud symbol rate, so
/// `bits_per_symbol` (the data throughput unit) is `bits_per_second / 2400`.
/// V.17 adds a rate-2/3 trellis code on top of the QAM constellation,
/// contributing one redundant constellation bit beyond the data bits
/// (see [`BitRate::total_symbol_bits`]); V.29 maps data bits straight onto
/// the constellation with no redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitRate {
    /// V.17 14400 bit/s: 6 data bits/symbol, trellis coded.
    V17_14400,
    /// V.17 12000 bit/s: 5 data bits/symbol, trellis coded.
    V17_12000,
    /// V.17 9600 bit/s: 4 data bits/symbol, trellis coded.
    V17_9600,
    /// V.17 7200 bit/s: 3 data bits/symbol, trellis coded (robust fallback mode).
    V17_7200,
    /// V.29 9600 bit/s: 4 data bits/symbol, uncoded.
    V29_9600,
    /// V.29 7200 bit/s: 3 data bits/symbol, uncoded.
    V29_7200,
    /// V.29 4800 bit/s: 2 data bits/symbol, uncoded.
    V29_4800,
}

impl BitRate {
    pub fn variant(self) -> ModemVariant {
        match self {
            BitRate::V17_14400 | BitRate::V17_12000 | BitRate::V17_9600 | BitRate::V17_7200 => {
                ModemVariant::V17
            }
            BitRate::V29_9600 | BitRate::V29_7200 | BitRate::V29_4800 => ModemVariant::V29,
        }
    }

    /// Data bits carried per baud.
    pub fn bits_per_symbol(self) -> u32 {
        match self {
            BitRate::V17_14400 => 6,
            BitRate::V17_12000 => 5,
            BitRate::V17_9600 => 4,
            BitRate::V17_7200 => 3,
            BitRate::V29_9600 => 4,
            BitRate::V29_7200 => 3,
            BitRate::V29_4800 => 2,
        }
    }

    /// Total constellation bits per symbol, including the trellis's
    /// redundant bit on V.17. Determines the constellation size
    /// (`2^total_symbol_bits`).
    pub fn total_symbol_bits(self) -> u32 {
        if self.is_trellis_coded() {
            self.bits_per_symbol() + 1
        } else {
            self.bits_per_symbol()
        }
    }

    /// Whether this rate is coded with the rate-2/3 convolutional trellis.
    pub fn is_trellis_coded(self) -> bool {
        self.variant() == ModemVariant::V17
    }

    pub fn bits_per_second(self) -> u32 {
        match self {
            BitRate::V17_14400 => 14400,
            BitRate::V17_12000 => 12000,
            BitRate::V17_9600 => 9600,
            BitRate::V17_7200 => 7200,
            BitRate::V29_9600 => 9600,
            BitRate::V29_7200 => 7200,
            BitRate::V29_4800 => 4800,
        }
    }

    pub fn from_v17_bps(rate: u32) -> Result<Self, ConfigError> {
        match rate {
            14400 => Ok(BitRate::V17_14400),
            12000 => Ok(BitRate::V17_12000),
            9600 => Ok(BitRate::V17_9600),
            7200 => Ok(BitRate::V17_7200),
            rate => Err(ConfigError::InvalidBitRate { rate }),
        }
    }

    pub fn from_v29_bps(rate: u32) -> Result<Self, ConfigError> {
        match rate {
            9600 => Ok(BitRate::V29_9600),
            7200 => Ok(BitRate::V29_7200),
            4800 => Ok(BitRate::V29_4800),
            rate => Err(ConfigError::InvalidV29BitRate { rate }),
        }
    }
}

/// Receiver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxConfig {
    pub bit_rate: BitRate,
    /// Use the abbreviated training sequence, reusing a prior
    /// [`crate::training::TrainingSnapshot`]'s carrier rate and equalizer
    /// taps instead of training from scratch.
    pub short_train: bool,
    /// Signal power, in dBm0, above which carrier is declared present.
    pub carrier_on_cutoff_dbm0: f32,
    /// Hysteresis gap (dB) below `carrier_on_cutoff_dbm0` at which carrier
    /// is declared absent again.
    pub carrier_off_hysteresis_db: f32,
    #[serde(skip)]
    pub log: Option<LogConfig>,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            bit_rate: BitRate::V17_14400,
            short_train: false,
            carrier_on_cutoff_dbm0: -26.0,
            carrier_off_hysteresis_db: 3.0,
            log: None,
        }
    }
}

impl RxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-43.0..=0.0).contains(&self.carrier_on_cutoff_dbm0) {
            return Err(ConfigError::InvalidCarrierCutoff {
                cutoff_dbm0: self.carrier_on_cutoff_dbm0,
            });
        }
        Ok(())
    }
}

/// Transmitter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxConfig {
    pub bit_rate: BitRate,
    pub short_train: bool,
    #[serde(skip)]
    pub log: Option<LogConfig>,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            bit_rate: BitRate::V17_14400,
            short_train: false,
            log: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v17_rate_lookup_rejects_unknown() {
        assert!(BitRate::from_v17_bps(2400).is_err());
        assert_eq!(BitRate::from_v17_bps(14400).unwrap(), BitRate::V17_14400);
    }

    #[test]
    fn v29_rate_lookup_rejects_unknown() {
        assert!(BitRate::from_v29_bps(14400).is_err());
        assert_eq!(BitRate::from_v29_bps(9600).unwrap(), BitRate::V29_9600);
    }

    #[test]
    fn default_cutoff_is_valid() {
        assert!(RxConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_cutoff_is_rejected() {
        let cfg = RxConfig {
            carrier_on_cutoff_dbm0: 10.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
