mod config;
mod logging;
mod telemetry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vmodem_core::callbacks::{BitCollector, BitSink};
use vmodem_core::config::{ModemVariant, RxConfig, TxConfig};
use vmodem_core::diagnostics::Diagnostics;
use vmodem_core::utils::{bits_to_string, string_to_bitstream};
use vmodem_core::{V17Receiver, V17Transmitter, V29Receiver, V29Transmitter};

use config::CliConfig;
use logging::{LogEvent, ModemEvent, StatisticsEvent, StructuredLogger};
use telemetry::TelemetryAggregator;

#[derive(Parser, Debug)]
#[command(author, version, about = "vmodem CLI: a V.17/V.29 fax-modem line-signal harness", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose diagnostic output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a text message into a WAV line-signal recording
    Encode {
        #[arg(short, long)]
        message: Option<String>,

        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Decode a WAV line-signal recording back into a text message
    Decode {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Transmit, pass through a simulated noisy channel, and decode in one pass
    Simulate {
        #[arg(short, long)]
        message: Option<String>,
    },
}

enum AnyTransmitter {
    V17(V17Transmitter),
    V29(V29Transmitter),
}

impl AnyTransmitter {
    fn new(config: TxConfig) -> Result<Self> {
        Ok(match config.bit_rate.variant() {
            ModemVariant::V17 => AnyTransmitter::V17(V17Transmitter::new(config)?),
            ModemVariant::V29 => AnyTransmitter::V29(V29Transmitter::new(config)?),
        })
    }

    fn training_sequence(&mut self) -> Vec<i16> {
        match self {
            AnyTransmitter::V17(tx) => tx.training_sequence(),
            AnyTransmitter::V29(tx) => tx.training_sequence(),
        }
    }

    fn transmit(&mut self, bits: &[u8]) -> Vec<i16> {
        match self {
            AnyTransmitter::V17(tx) => tx.transmit(bits),
            AnyTransmitter::V29(tx) => tx.transmit(bits),
        }
    }
}

enum AnyReceiver {
    V17(V17Receiver),
    V29(V29Receiver),
}

impl AnyReceiver {
    fn new(config: RxConfig) -> Result<Self> {
        Ok(match config.bit_rate.variant() {
            ModemVariant::V17 => AnyReceiver::V17(V17Receiver::new(config)?),
            ModemVariant::V29 => AnyReceiver::V29(V29Receiver::new(config)?),
        })
    }

    fn receive(&mut self, samples: &[i16], sink: &mut dyn BitSink) {
        match self {
            AnyReceiver::V17(rx) => rx.receive(samples, sink),
            AnyReceiver::V29(rx) => rx.receive(samples, sink),
        }
    }

    fn diagnostics(&self) -> Diagnostics {
        match self {
            AnyReceiver::V17(rx) => rx.diagnostics(),
            AnyReceiver::V29(rx) => rx.diagnostics(),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path).wrap_err_with(|| format!("Failed to load config from {}", path))?
    } else {
        CliConfig::default()
    };

    let mut logger = StructuredLogger::new(config.terminal.logging.clone())?;

    match args.command {
        Command::Encode { message, output } => {
            if let Some(path) = output {
                config.terminal.wav_output = Some(path);
            }
            let message = message.unwrap_or_else(|| "HELLO VMODEM".to_string());
            cmd_encode(&config, &message, &mut logger)?;
        }
        Command::Decode { input } => {
            if let Some(path) = input {
                config.terminal.wav_input = Some(path);
            }
            cmd_decode(&config, args.verbose, &mut logger)?;
        }
        Command::Simulate { message } => {
            let message = message.unwrap_or_else(|| "HELLO VMODEM".to_string());
            cmd_simulate(&config, &message, args.verbose, &mut logger)?;
        }
    }

    Ok(())
}

fn cmd_encode(config: &CliConfig, message: &str, logger: &mut StructuredLogger) -> Result<()> {
    let wav_path = config
        .terminal
        .wav_output
        .clone()
        .ok_or_else(|| color_eyre::eyre::eyre!("encode requires --output or terminal.wav_output in config"))?;

    logger.log(LogEvent::Info {
        message: format!("encoding \"{}\" at {:?}", message, config.modem.bit_rate),
    })?;

    let log_config = config.terminal.logging.to_core_log_config();
    let mut tx = AnyTransmitter::new(config.modem.to_tx_config(Some(log_config)))?;

    let data_bits = string_to_bitstream(message);
    let mut samples = tx.training_sequence();
    samples.extend(tx.transmit(&data_bits));

    write_wav(&wav_path, &samples)?;

    logger.log(LogEvent::Info {
        message: format!(
            "wrote {} samples ({:.2}s) to {}",
            samples.len(),
            samples.len() as f64 / vmodem_core::v17::SAMPLE_RATE_HZ,
            wav_path.display()
        ),
    })?;

    Ok(())
}

fn write_wav(path: &PathBuf, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: vmodem_core::v17::SAMPLE_RATE_HZ as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;

    let bar = ProgressBar::new(samples.len() as u64).with_style(ProgressStyle::default_bar());
    for &sample in samples {
        writer.write_sample(sample)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    writer.finalize()?;
    Ok(())
}

fn cmd_decode(config: &CliConfig, verbose: bool, logger: &mut StructuredLogger) -> Result<()> {
    let wav_path = config
        .terminal
        .wav_input
        .clone()
        .ok_or_else(|| color_eyre::eyre::eyre!("decode requires --input or terminal.wav_input in config"))?;

    let mut reader =
        hound::WavReader::open(&wav_path).wrap_err_with(|| format!("failed to open {}", wav_path.display()))?;
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, hound::Error>>()
        .wrap_err("failed to read WAV samples")?;

    logger.log(LogEvent::Info {
        message: format!("decoding {} samples from {}", samples.len(), wav_path.display()),
    })?;

    let log_config = config.terminal.logging.to_core_log_config();
    let mut rx = AnyReceiver::new(config.modem.to_rx_config(Some(log_config)))?;

    let chunk_len = ((vmodem_core::v17::SAMPLE_RATE_HZ * config.terminal.diagnostics_interval_secs) as usize).max(1);
    let mut collector = BitCollector::default();
    let mut telemetry = TelemetryAggregator::new(config.terminal.diagnostics_interval_secs);

    let bar = ProgressBar::new(samples.len() as u64).with_style(ProgressStyle::default_bar());
    for chunk in samples.chunks(chunk_len) {
        rx.receive(chunk, &mut collector);
        bar.inc(chunk.len() as u64);

        for event in collector.events.drain(..) {
            logger.log(LogEvent::Modem(ModemEvent {
                timestamp: chrono::Utc::now(),
                kind: format!("{:?}", event),
            }))?;
        }

        let diagnostics = rx.diagnostics();
        if let Some(telemetry_event) = telemetry.sample(&diagnostics, collector.bits.len()) {
            logger.log(LogEvent::Telemetry(telemetry_event))?;
        }
    }
    bar.finish_and_clear();

    let (power_stats, freq_stats) = telemetry.compute_statistics();
    logger.log(LogEvent::Statistics(StatisticsEvent {
        timestamp: chrono::Utc::now(),
        duration_secs: logger.elapsed(),
        signal_power_dbm0: power_stats,
        carrier_frequency_hz: freq_stats,
        total_bits_decoded: collector.bits.len(),
    }))?;

    let recovered = bits_to_string(&collector.bits);
    if verbose {
        logger.log(LogEvent::Info {
            message: format!("raw decoded bits: {}", collector.bits.len()),
        })?;
    }
    logger.log(LogEvent::Info {
        message: format!("recovered message: {}", recovered),
    })?;

    Ok(())
}

fn cmd_simulate(config: &CliConfig, message: &str, verbose: bool, logger: &mut StructuredLogger) -> Result<()> {
    logger.log(LogEvent::Info {
        message: format!("simulating \"{}\" at {:?}", message, config.modem.bit_rate),
    })?;

    let log_config = config.terminal.logging.to_core_log_config();
    let mut tx = AnyTransmitter::new(config.modem.to_tx_config(Some(log_config.clone())))?;

    let data_bits = string_to_bitstream(message);
    let mut line_samples = tx.training_sequence();
    line_samples.extend(tx.transmit(&data_bits));

    let normalized: Vec<f32> = line_samples
        .iter()
        .map(|&s| s as f32 / 32768.0 * config.channel.attenuation as f32)
        .collect();
    let mut rng = StdRng::seed_from_u64(config.channel.seed);
    let noisy = vmodem_core::channel::apply_line_noise(&normalized, config.channel.noise_std, &mut rng);
    let noisy_i16: Vec<i16> = noisy.iter().map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16).collect();

    let mut rx = AnyReceiver::new(config.modem.to_rx_config(Some(log_config)))?;
    let mut collector = BitCollector::default();
    rx.receive(&noisy_i16, &mut collector);

    for event in &collector.events {
        logger.log(LogEvent::Modem(ModemEvent {
            timestamp: chrono::Utc::now(),
            kind: format!("{:?}", event),
        }))?;
    }

    let recovered = bits_to_string(&collector.bits);
    if verbose {
        logger.log(LogEvent::Info {
            message: format!("sent {} bits, recovered {} bits", data_bits.len(), collector.bits.len()),
        })?;
    }
    logger.log(LogEvent::Info {
        message: format!("recovered message: {}", recovered),
    })?;

    Ok(())
}
