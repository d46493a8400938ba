//! Structured logging for telemetry and modem lifecycle events.

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::{LogFormat, LogTarget, LoggingConfig};

/// Structured log event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// Periodic receiver diagnostics sample
    Telemetry(TelemetryEvent),

    /// Modem lifecycle transition (carrier up/down, training outcome)
    Modem(ModemEvent),

    /// Statistical summary event, emitted once at the end of a run
    Statistics(StatisticsEvent),

    /// General info message
    Info { message: String },

    /// Warning message
    Warn { message: String },

    /// Error message
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub signal_power_dbm0: f32,
    pub carrier_frequency_hz: f64,
    pub gardner_total_correction: i64,
    pub bits_decoded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub signal_power_dbm0: StatSummary,
    pub carrier_frequency_hz: StatSummary,
    pub total_bits_decoded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Logger that outputs structured logs
pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event)?,
            LogFormat::Pretty => self.format_pretty(&event)?,
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;

        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> Result<String> {
        let ts = Utc::now().to_rfc3339();

        let msg = match event {
            LogEvent::Telemetry(t) => {
                format!(
                    "ts=\"{}\" type=telemetry signal_power_dbm0={:.2} carrier_freq_hz={:.2} gardner_correction={} bits={}",
                    ts, t.signal_power_dbm0, t.carrier_frequency_hz, t.gardner_total_correction, t.bits_decoded
                )
            }
            LogEvent::Modem(m) => {
                format!("ts=\"{}\" type=modem kind=\"{}\"", ts, m.kind)
            }
            LogEvent::Statistics(s) => {
                format!(
                    "ts=\"{}\" type=statistics duration_secs={:.2} total_bits={} signal_power_mean={:.2} carrier_freq_mean={:.2}",
                    ts, s.duration_secs, s.total_bits_decoded, s.signal_power_dbm0.mean, s.carrier_frequency_hz.mean
                )
            }
            LogEvent::Info { message } => format!("ts=\"{}\" level=info msg=\"{}\"", ts, message),
            LogEvent::Warn { message } => format!("ts=\"{}\" level=warn msg=\"{}\"", ts, message),
            LogEvent::Error { message, details } => {
                if let Some(d) = details {
                    format!("ts=\"{}\" level=error msg=\"{}\" details=\"{}\"", ts, message, d)
                } else {
                    format!("ts=\"{}\" level=error msg=\"{}\"", ts, message)
                }
            }
        };

        Ok(msg)
    }

    fn format_pretty(&self, event: &LogEvent) -> Result<String> {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");

        let msg = match event {
            LogEvent::Telemetry(t) => {
                format!(
                    "[{}] TELEMETRY: power={:.2}dBm0 carrier={:.2}Hz gardner_correction={} bits={}",
                    ts, t.signal_power_dbm0, t.carrier_frequency_hz, t.gardner_total_correction, t.bits_decoded
                )
            }
            LogEvent::Modem(m) => format!("[{}] MODEM: {}", ts, m.kind),
            LogEvent::Statistics(s) => {
                format!(
                    "[{}] STATISTICS ({:.2}s): bits={} | power: μ={:.2} σ={:.2} [{:.2},{:.2}] | carrier: μ={:.2} σ={:.2} [{:.2},{:.2}]",
                    ts, s.duration_secs, s.total_bits_decoded,
                    s.signal_power_dbm0.mean, s.signal_power_dbm0.stddev, s.signal_power_dbm0.min, s.signal_power_dbm0.max,
                    s.carrier_frequency_hz.mean, s.carrier_frequency_hz.stddev, s.carrier_frequency_hz.min, s.carrier_frequency_hz.max
                )
            }
            LogEvent::Info { message } => format!("[{}] INFO: {}", ts, message),
            LogEvent::Warn { message } => format!("[{}] WARN: {}", ts, message),
            LogEvent::Error { message, details } => {
                if let Some(d) = details {
                    format!("[{}] ERROR: {} | {}", ts, message, d)
                } else {
                    format!("[{}] ERROR: {}", ts, message)
                }
            }
        };

        Ok(msg)
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
