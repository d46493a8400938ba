//! V.29 transmitter: scramble, differentially encode the quadrant against
//! the previous constellation state, assemble with the uncoded bits, map
//! to a constellation point, pulse-shape, and upconvert. No trellis.

use crate::config::TxConfig;
use crate::constellation::Constellation;
use crate::dds::{phase_rate_of_frequency, Dds};
use crate::differential::{assemble_symbol, DifferentialEncoder};
use crate::errors::ModemError;
use crate::logging::SignalLogger;
use crate::rrc::RrcInterpolator;
use crate::sample::Sample;
use crate::scrambler::Scrambler;
use crate::training::budget;

use super::{BAUD_RATE_HZ, CARRIER_FREQ_HZ, NOMINAL_SAMPLES_PER_SYMBOL, SAMPLE_RATE_HZ};

const TX_AMPLITUDE: f32 = 0.6;

pub struct V29Transmitter {
    config: TxConfig,
    logger: SignalLogger,
    constellation: Constellation,
    bits_per_symbol: u32,

    scrambler: Scrambler,
    differential: DifferentialEncoder,
    pulse_shaper: RrcInterpolator,
    mixer: Dds,
    carrier_phase_rate: i32,

    /// Running count of line samples emitted and symbols encoded, used to
    /// zero-stuff the non-integral 8000/2400 samples-per-symbol ratio
    /// without drifting off the nominal symbol clock over a long call.
    samples_emitted: u64,
    symbols_emitted: u64,
}

impl V29Transmitter {
    pub fn new(config: TxConfig) -> Result<Self, ModemError> {
        let constellation = Constellation::for_bit_rate(config.bit_rate);
        let bits_per_symbol = config.bit_rate.bits_per_symbol();
        let logger = SignalLogger::new(config.log.clone().unwrap_or_default());
        Ok(Self {
            scrambler: Scrambler::v29(),
            differential: DifferentialEncoder::new(),
            pulse_shaper: RrcInterpolator::new(BAUD_RATE_HZ, SAMPLE_RATE_HZ),
            mixer: Dds::new(),
            carrier_phase_rate: phase_rate_of_frequency(CARRIER_FREQ_HZ, SAMPLE_RATE_HZ),
            samples_emitted: 0,
            symbols_emitted: 0,
            bits_per_symbol,
            constellation,
            config,
            logger,
        })
    }

    pub fn restart(&mut self) {
        self.scrambler.reset();
        self.differential.reset();
        self.pulse_shaper = RrcInterpolator::new(BAUD_RATE_HZ, SAMPLE_RATE_HZ);
        self.mixer = Dds::new();
        self.samples_emitted = 0;
        self.symbols_emitted = 0;
    }

    pub fn transmit(&mut self, data_bits: &[u8]) -> Vec<i16> {
        let mut out = Vec::with_capacity(
            data_bits.len() * NOMINAL_SAMPLES_PER_SYMBOL / self.bits_per_symbol as usize
                + NOMINAL_SAMPLES_PER_SYMBOL,
        );
        for chunk in data_bits.chunks(self.bits_per_symbol as usize) {
            let mut group = chunk.to_vec();
            group.resize(self.bits_per_symbol as usize, 0);
            let symbol = self.encode_symbol(&group);
            out.extend(self.emit_symbol(symbol));
        }
        out
    }

    pub fn training_sequence(&mut self) -> Vec<i16> {
        let mut out = Vec::new();
        let unmodulated_symbols =
            budget::GAIN_SET_SYMBOLS + budget::SYMBOL_ACQUISITION_SYMBOLS + budget::COARSE_CARRIER_SYMBOLS;
        let carrier_point = self.constellation.point(0);
        for _ in 0..unmodulated_symbols {
            out.extend(self.emit_symbol(carrier_point));
        }

        for i in 0..budget::EQUALIZER_TRAIN_SYMBOLS {
            let bits: Vec<u8> = (0..self.bits_per_symbol).map(|b| ((i >> b) & 1) as u8).collect();
            let symbol = self.encode_symbol(&bits);
            out.extend(self.emit_symbol(symbol));
        }

        let ones = vec![1u8; self.bits_per_symbol as usize];
        for _ in 0..budget::TEP_VERIFY_SYMBOLS {
            let symbol = self.encode_symbol(&ones);
            out.extend(self.emit_symbol(symbol));
        }

        self.logger.info("TRAINING", "training sequence generated");
        out
    }

    /// Differentially encodes the top two (quadrant) bits against the
    /// previous constellation quadrant and sends the rest uncoded.
    fn encode_symbol(&mut self, bits: &[u8]) -> Sample {
        debug_assert_eq!(bits.len(), self.bits_per_symbol as usize);
        let scrambled: Vec<u8> = bits.iter().map(|&b| self.scrambler.scramble(b)).collect();
        let delta = (scrambled[0] << 1) | scrambled[1];
        let quadrant = self.differential.encode(delta);
        let symbol = assemble_symbol(quadrant, &scrambled[2..]);
        self.constellation.point(symbol)
    }

    /// Emits one symbol's worth of line samples, zero-stuffing the pulse
    /// shaper up to the fractional 8000/2400 sample rate. See
    /// [`crate::v17::tx::V17Transmitter::emit_symbol`] for the rounding
    /// rationale.
    fn emit_symbol(&mut self, symbol: Sample) -> Vec<i16> {
        self.symbols_emitted += 1;
        let target = (self.symbols_emitted as f64 * SAMPLE_RATE_HZ / BAUD_RATE_HZ).round() as u64;
        let count = (target - self.samples_emitted).max(1) as usize;
        self.samples_emitted = target;

        let mut out = Vec::with_capacity(count);
        self.pulse_shaper.push(symbol);
        out.push(self.upconvert());
        for _ in 1..count {
            self.pulse_shaper.push(Sample::new(0.0, 0.0));
            out.push(self.upconvert());
        }
        out
    }

    fn upconvert(&mut self) -> i16 {
        let baseband = self.pulse_shaper.interpolate(0);
        let carrier = self.mixer.step(self.carrier_phase_rate);
        let passband = (baseband * carrier).re * TX_AMPLITUDE;
        (passband.clamp(-1.0, 1.0) * 32767.0) as i16
    }
}
