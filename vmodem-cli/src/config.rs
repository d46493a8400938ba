//! CLI-specific configuration structures for TOML-based configuration.

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use vmodem_core::config::{BitRate, RxConfig, TxConfig};
use vmodem_core::logging::LogConfig;

/// Deep merge JSON values - override takes precedence over base
/// For objects, recursively merge; for arrays and primitives, override replaces base
fn merge_json_values(base: &mut JsonValue, override_val: JsonValue) {
    match (base, override_val) {
        (JsonValue::Object(base_map), JsonValue::Object(override_map)) => {
            // Recursively merge objects
            for (key, value) in override_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    // Key exists in both - recursively merge
                    merge_json_values(base_value, value);
                } else {
                    // Key only in override - insert it
                    base_map.insert(key, value);
                }
            }
        }
        (base_val, override_val) => {
            // For non-objects, override completely replaces base
            *base_val = override_val;
        }
    }
}

/// Custom deserializer to handle both single string and array of strings for include
fn deserialize_include_optional<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
    }

    let opt: Option<StringOrVec> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(Vec::new()),
        Some(StringOrVec::String(s)) => Ok(vec![s]),
        Some(StringOrVec::Vec(v)) => Ok(v),
    }
}

/// Modem-side settings shared by the transmit and receive paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemSettings {
    pub bit_rate: BitRate,

    #[serde(default)]
    pub short_train: bool,

    #[serde(default = "default_carrier_on_cutoff")]
    pub carrier_on_cutoff_dbm0: f32,

    #[serde(default = "default_carrier_off_hysteresis")]
    pub carrier_off_hysteresis_db: f32,
}

fn default_carrier_on_cutoff() -> f32 {
    -26.0
}

fn default_carrier_off_hysteresis() -> f32 {
    3.0
}

impl Default for ModemSettings {
    fn default() -> Self {
        Self {
            bit_rate: BitRate::V17_14400,
            short_train: false,
            carrier_on_cutoff_dbm0: default_carrier_on_cutoff(),
            carrier_off_hysteresis_db: default_carrier_off_hysteresis(),
        }
    }
}

impl ModemSettings {
    pub fn to_rx_config(&self, log: Option<LogConfig>) -> RxConfig {
        RxConfig {
            bit_rate: self.bit_rate,
            short_train: self.short_train,
            carrier_on_cutoff_dbm0: self.carrier_on_cutoff_dbm0,
            carrier_off_hysteresis_db: self.carrier_off_hysteresis_db,
            log,
        }
    }

    pub fn to_tx_config(&self, log: Option<LogConfig>) -> TxConfig {
        TxConfig {
            bit_rate: self.bit_rate,
            short_train: self.short_train,
            log,
        }
    }
}

/// Simulated-channel impairment settings, used by the `simulate` subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelParams {
    #[serde(default)]
    pub noise_std: f64,

    #[serde(default = "default_attenuation")]
    pub attenuation: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_attenuation() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    42
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            noise_std: 0.0,
            attenuation: default_attenuation(),
            seed: default_seed(),
        }
    }
}

/// Complete CLI configuration bundle
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    /// Optional path(s) to other config file(s) to include (relative to this config's directory)
    /// Supports single string or array of strings
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_include_optional")]
    pub include: Vec<String>,

    /// Modem bit rate, training mode, and carrier-detection thresholds.
    #[serde(default)]
    pub modem: ModemSettings,

    /// Simulated channel impairments for the `simulate` subcommand.
    #[serde(default)]
    pub channel: ChannelParams,

    /// Terminal interface configuration
    #[serde(default)]
    pub terminal: TerminalConfig,
}

/// Terminal interface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Output WAV filename, for `encode` (optional)
    #[serde(default)]
    pub wav_output: Option<PathBuf>,

    /// Input WAV filename, for `decode` (optional)
    #[serde(default)]
    pub wav_input: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Diagnostics sampling interval in seconds, while decoding
    #[serde(default = "default_diagnostics_interval")]
    pub diagnostics_interval_secs: f64,
}

fn default_diagnostics_interval() -> f64 {
    1.0
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            wav_output: None,
            wav_input: None,
            logging: LoggingConfig::default(),
            diagnostics_interval_secs: default_diagnostics_interval(),
        }
    }
}

/// Logging output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log output target
    #[serde(default = "default_log_target")]
    pub target: LogTarget,

    /// Log file path (if target is File)
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stdout
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Convert CLI logging config to the core's per-instance logger config.
    pub fn to_core_log_config(&self) -> LogConfig {
        use vmodem_core::logging::LogLevel as CoreLogLevel;

        let level = match self.level {
            LogLevel::Debug => CoreLogLevel::Debug,
            LogLevel::Info => CoreLogLevel::Info,
            LogLevel::Warn => CoreLogLevel::Warn,
            LogLevel::Error => CoreLogLevel::Error,
        };

        LogConfig {
            level,
            enable_agc: true,
            enable_timing: true,
            enable_carrier: true,
            enable_decode: true,
            enable_training: true,
            max_entries: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl CliConfig {
    /// Load configuration from TOML file with include support
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        // Parse as raw TOML value first to allow partial configs
        let config_toml: toml::Value = toml::from_str(&content)
            .wrap_err("Failed to parse TOML configuration")?;

        // Convert to JSON for easier manipulation
        let mut config_json = serde_json::to_value(&config_toml)
            .wrap_err("Failed to convert TOML to JSON")?;

        // Extract and process include directives
        let includes = match config_json.get("include") {
            Some(JsonValue::String(s)) => vec![s.clone()],
            Some(JsonValue::Array(arr)) => {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            }
            _ => Vec::new(),
        };

        // Remove include from the config JSON
        if let JsonValue::Object(ref mut map) = config_json {
            map.remove("include");
        }

        // Always start with defaults as base to support partial configs
        let mut base_json = serde_json::to_value(&Self::default())
            .wrap_err("Failed to create default config")?;

        // Process includes in order if present
        if !includes.is_empty() {
            for include_path in &includes {
                let include_full_path = if Path::new(include_path).is_absolute() {
                    PathBuf::from(include_path)
                } else {
                    path.parent()
                        .unwrap_or_else(|| Path::new("."))
                        .join(include_path)
                };

                let included_config = Self::from_file(&include_full_path)
                    .wrap_err_with(|| format!("Failed to load included config: {}", include_full_path.display()))?;

                let included_json = serde_json::to_value(&included_config)
                    .wrap_err("Failed to convert included config to JSON")?;

                merge_json_values(&mut base_json, included_json);
            }
        }

        // Finally merge current config on top (it has highest priority)
        merge_json_values(&mut base_json, config_json);
        let config_json = base_json;

        let config: CliConfig = serde_json::from_value(config_json)
            .wrap_err("Failed to parse final configuration")?;

        Ok(config)
    }
}
