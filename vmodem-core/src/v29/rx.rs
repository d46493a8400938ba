//! V.29 receiver: same pipeline as [`crate::v17::rx::V17Receiver`] minus
//! the trellis/space-map decode, since V.29 has no coded redundancy —
//! the nearest constellation point decides the symbol directly.

use crate::callbacks::{BitSink, Event};
use crate::carrier_tracker::{fast_atan2, CarrierTracker};
use crate::config::RxConfig;
use crate::constellation::Constellation;
use crate::dds::{phase_rate_of_frequency, Dds};
use crate::differential::{split_symbol, DifferentialDecoder};
use crate::diagnostics::{carrier_frequency_hz, Diagnostics};
use crate::equalizer::Equalizer;
use crate::errors::ModemError;
use crate::gardner::GardnerTimingRecovery;
use crate::logging::SignalLogger;
use crate::power_meter::{apply_agc, PowerMeter};
use crate::rrc::RrcInterpolator;
use crate::sample::Sample;
use crate::scrambler::Scrambler;
use crate::training::{budget, TrainingPhase, TrainingState};
use crate::errors::TrainingFailure;

use super::{raw_to_f32, BAUD_RATE_HZ, CARRIER_FREQ_HZ, SAMPLE_RATE_HZ};

const EQ_TAPS: usize = 9;
const EQ_DELTA_ACQUIRE: f32 = 1.0 / 32.0;
const EQ_DELTA_TRACK: f32 = 1.0 / 1024.0;
/// Virtual upsample ticks per raw input sample (the conceptual ×3 to
/// 24 kHz); every fifth such tick, adjusted by `pickoff`, is retained as
/// a T/2 sample, giving the 4800 Hz T/2 rate from an 8 kHz input.
const TICKS_PER_SAMPLE: i64 = crate::rrc::FILTER_STEPS as i64;
const PICKOFF_CYCLE: i64 = 5;
/// Angle-error threshold (radians) past which a coarse-carrier observation
/// is treated as a quadrant-scale jump rather than tracking noise.
const COARSE_JUMP_THRESHOLD: f32 = 0.3;

pub struct V29Receiver {
    config: RxConfig,
    logger: SignalLogger,
    constellation: Constellation,
    num_uncoded_bits: u32,

    power_meter: PowerMeter,
    mixer: Dds,
    interpolator: RrcInterpolator,
    gardner: GardnerTimingRecovery,
    equalizer: Equalizer,
    carrier: CarrierTracker,
    differential: DifferentialDecoder,
    descrambler: Scrambler,
    training: TrainingState,

    agc_scaling: f32,
    n_mod5: u32,
    pickoff: i64,
    next_tick_is_on: bool,
    last_on_output: Option<Sample>,
    pending_mid: Option<Sample>,
    tep_bit_index: u32,
    tep_ones_run: u32,
}

impl V29Receiver {
    pub fn new(config: RxConfig) -> Result<Self, ModemError> {
        config.validate()?;
        let constellation = Constellation::for_bit_rate(config.bit_rate);
        let num_uncoded_bits = config.bit_rate.bits_per_symbol() - 2;
        let logger = SignalLogger::new(config.log.clone().unwrap_or_default());

        let mut carrier = CarrierTracker::new(0.05, 0.002);
        carrier.set_phase_rate(phase_rate_of_frequency(-CARRIER_FREQ_HZ, SAMPLE_RATE_HZ));

        Ok(Self {
            power_meter: PowerMeter::new(
                config.carrier_on_cutoff_dbm0,
                config.carrier_off_hysteresis_db,
            ),
            mixer: Dds::new(),
            interpolator: RrcInterpolator::new(BAUD_RATE_HZ, SAMPLE_RATE_HZ),
            gardner: GardnerTimingRecovery::new(0.02),
            equalizer: Equalizer::new(EQ_TAPS, EQ_DELTA_ACQUIRE),
            carrier,
            differential: DifferentialDecoder::new(),
            descrambler: Scrambler::v29(),
            training: TrainingState::new(config.short_train),
            agc_scaling: 1.0,
            n_mod5: 0,
            pickoff: 0,
            next_tick_is_on: false,
            last_on_output: None,
            pending_mid: None,
            tep_bit_index: 0,
            tep_ones_run: 0,
            num_uncoded_bits,
            constellation,
            config,
            logger,
        })
    }

    pub fn restart(&mut self) {
        let snapshot = self.training.snapshot.take();
        self.power_meter.reset();
        self.mixer = Dds::new();
        self.gardner.reset();
        self.equalizer.reset_taps();
        self.carrier.reset_loop();
        self.carrier
            .set_phase_rate(phase_rate_of_frequency(-CARRIER_FREQ_HZ, SAMPLE_RATE_HZ));
        self.differential.reset();
        self.descrambler.reset();
        self.training = TrainingState::new(self.config.short_train);
        self.training.snapshot = snapshot;
        self.agc_scaling = 1.0;
        self.n_mod5 = 0;
        self.pickoff = 0;
        self.next_tick_is_on = false;
        self.last_on_output = None;
        self.pending_mid = None;
        self.tep_bit_index = 0;
        self.tep_ones_run = 0;
    }

    pub fn receive(&mut self, samples: &[i16], sink: &mut dyn BitSink) {
        for &raw in samples {
            self.process_sample(raw_to_f32(raw), sink);
        }
    }

    fn process_sample(&mut self, raw: f32, sink: &mut dyn BitSink) {
        if let Some(present) = self.power_meter.update(raw) {
            self.logger.info("AGC", format_args!("carrier present: {present}"));
            if present {
                if self.training.phase == TrainingPhase::Idle {
                    self.training.enter(TrainingPhase::SignalPresent);
                }
                sink.accept_event(Event::CarrierUp);
            } else {
                self.training.enter(TrainingPhase::Idle);
                sink.accept_event(Event::CarrierDown);
            }
        }

        if self.training.phase == TrainingPhase::Idle {
            return;
        }

        if self.training.phase == TrainingPhase::GainSet {
            self.agc_scaling = self.power_meter.agc_scaling();
        }

        let baseband = self.mixer.step(self.carrier.phase_rate()) * raw;
        let baseband = apply_agc(baseband, self.agc_scaling);
        self.interpolator.push(baseband);

        for step in 0..crate::rrc::FILTER_STEPS {
            let tick = TICKS_PER_SAMPLE * self.n_mod5 as i64 + step as i64;
            if (tick + self.pickoff).rem_euclid(PICKOFF_CYCLE) == 0 {
                let sample = self.interpolator.interpolate(step);
                self.on_tick(sample, sink);
            }
        }
        self.n_mod5 = (self.n_mod5 + 1) % PICKOFF_CYCLE as u32;
    }

    /// Handles one retained T/2 sample, alternating between the mid-symbol
    /// tick (stored for Gardner, no decision) and the on-symbol tick (feeds
    /// Gardner, the carrier tracker, and the slicer).
    fn on_tick(&mut self, sample: Sample, sink: &mut dyn BitSink) {
        self.equalizer.push(sample);
        let equalized = self.equalizer.output();

        if self.next_tick_is_on {
            if let (Some(last_on), Some(mid)) = (self.last_on_output, self.pending_mid) {
                let adjust = self.gardner.update(last_on, mid, equalized);
                self.pickoff += adjust as i64;
            }
            self.last_on_output = Some(equalized);
            self.next_tick_is_on = false;
            self.on_symbol(sample, equalized, sink);
        } else {
            self.pending_mid = Some(equalized);
            self.next_tick_is_on = true;
        }
    }

    fn on_symbol(&mut self, raw: Sample, equalized: Sample, sink: &mut dyn BitSink) {
        self.training.tick();

        if self.training.phase == TrainingPhase::CoarseCarrier {
            let reference = self.constellation.point(0);
            let expected_angle = fast_atan2(reference.im, reference.re);
            if let Some(jump) = self.carrier.coarse_rotation(raw, expected_angle, COARSE_JUMP_THRESHOLD) {
                let elapsed = self.training.symbols_in_phase.max(1) as f32;
                self.carrier.apply_coarse_frequency_nudge(jump / elapsed);
            }
        }

        let (decision_symbol, decision_point) = self.constellation.nearest(equalized);
        let rotation = equalized * decision_point.conj();
        let phase_error = fast_atan2(rotation.im, rotation.re);
        self.carrier.fine_track(phase_error);

        if self.training.phase == TrainingPhase::EqualizerTrain
            || self.training.phase == TrainingPhase::TepVerify
            || self.training.phase == TrainingPhase::Data
        {
            let error = decision_point - equalized;
            self.equalizer.adapt(error);
            if self.training.phase == TrainingPhase::Data {
                self.equalizer.set_delta(EQ_DELTA_TRACK);
            }
        }

        if self.training.phase == TrainingPhase::TepVerify || self.training.phase == TrainingPhase::Data {
            let (quadrant, uncoded_bits) = split_symbol(decision_symbol, self.num_uncoded_bits);
            let delta = self.differential.decode(quadrant);
            let mut bits = vec![(delta >> 1) & 1, delta & 1];
            bits.extend(uncoded_bits);
            let descrambled: Vec<u8> = bits.iter().map(|&b| self.descrambler.descramble(b)).collect();
            if self.training.phase == TrainingPhase::Data {
                for bit in descrambled {
                    sink.accept_bit(bit);
                }
            } else {
                for bit in descrambled {
                    self.track_tep_bit(bit);
                }
            }
        }

        self.advance_training(sink);
    }

    /// Counts descrambled ones from bit 24 onward during `TepVerify`,
    /// resetting the run on any zero bit.
    fn track_tep_bit(&mut self, bit: u8) {
        self.tep_bit_index += 1;
        if self.tep_bit_index <= budget::TEP_IGNORE_BITS {
            return;
        }
        if bit == 1 {
            self.tep_ones_run += 1;
        } else {
            self.tep_ones_run = 0;
        }
    }

    fn advance_training(&mut self, sink: &mut dyn BitSink) {
        use TrainingPhase::*;
        let (acquired, timeout, failure) = match self.training.phase {
            Idle | Data => return,
            SignalPresent => (self.training.symbols_in_phase >= 1, 4, TrainingFailure::NoCarrier),
            GainSet => (
                self.training.symbols_in_phase >= budget::GAIN_SET_SYMBOLS / 2,
                budget::GAIN_SET_SYMBOLS,
                TrainingFailure::TimingAcquisitionTimeout,
            ),
            SymbolAcquisition => (
                self.training.symbols_in_phase >= budget::SYMBOL_ACQUISITION_SYMBOLS / 2,
                budget::SYMBOL_ACQUISITION_SYMBOLS,
                TrainingFailure::TimingAcquisitionTimeout,
            ),
            CoarseCarrier => (
                self.training.symbols_in_phase >= budget::COARSE_CARRIER_SYMBOLS / 2,
                budget::COARSE_CARRIER_SYMBOLS,
                TrainingFailure::CoarseCarrierTimeout,
            ),
            EqualizerTrain => (
                self.training.symbols_in_phase >= budget::EQUALIZER_TRAIN_SYMBOLS / 2,
                budget::EQUALIZER_TRAIN_SYMBOLS,
                TrainingFailure::EqualizerTimeout,
            ),
            TepVerify => (
                self.tep_ones_run >= budget::TEP_ONES_THRESHOLD,
                budget::TEP_VERIFY_SYMBOLS,
                TrainingFailure::TepVerifyFailed,
            ),
        };

        if self.training.symbols_in_phase >= timeout {
            self.logger.warn("TRAINING", format_args!("{:?} timed out", self.training.phase));
            sink.accept_event(Event::TrainingFailed(failure));
            self.training.enter(Idle);
        } else if acquired {
            if self.training.phase == TepVerify {
                self.training
                    .save_snapshot(self.carrier.phase_rate(), self.equalizer.snapshot());
            }
            let next = self.training.next_phase();
            self.training.enter(next);
            if next == TepVerify {
                self.tep_bit_index = 0;
                self.tep_ones_run = 0;
            }
            if next == EqualizerTrain && self.training.short_train {
                if let Some(snapshot) = self.training.snapshot.clone() {
                    self.carrier.set_phase_rate(snapshot.carrier_phase_rate);
                    self.equalizer.restore(&snapshot.equalizer_taps);
                }
            }
            if next == Data {
                self.logger.info("TRAINING", "training succeeded");
                sink.accept_event(Event::TrainingSucceeded);
            }
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let nominal_down_mix_rate = phase_rate_of_frequency(-CARRIER_FREQ_HZ, SAMPLE_RATE_HZ);
        let offset = self.carrier.phase_rate().wrapping_sub(nominal_down_mix_rate);
        Diagnostics {
            signal_power_dbm0: self.power_meter.signal_power_dbm0(),
            carrier_frequency_hz: CARRIER_FREQ_HZ - carrier_frequency_hz(offset, SAMPLE_RATE_HZ),
            equalizer_taps: self.equalizer.snapshot(),
            gardner_total_correction: self.gardner.total_correction(),
        }
    }

    pub fn logger(&self) -> &SignalLogger {
        &self.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::BitCollector;

    #[test]
    fn idle_receiver_ignores_silence() {
        let mut rx = V29Receiver::new(RxConfig {
            bit_rate: crate::config::BitRate::V29_9600,
            ..Default::default()
        })
        .unwrap();
        let mut sink = BitCollector::default();
        rx.receive(&vec![0i16; 500], &mut sink);
        assert!(sink.bits.is_empty());
    }

    #[test]
    fn loud_signal_raises_carrier_up_event() {
        let mut rx = V29Receiver::new(RxConfig {
            bit_rate: crate::config::BitRate::V29_9600,
            ..Default::default()
        })
        .unwrap();
        let mut sink = BitCollector::default();
        let tone: Vec<i16> = (0..2000)
            .map(|i| {
                let phase = i as f64 * std::f64::consts::TAU * CARRIER_FREQ_HZ / SAMPLE_RATE_HZ;
                (phase.sin() * 12000.0) as i16
            })
            .collect();
        rx.receive(&tone, &mut sink);
        assert!(sink.events.contains(&Event::CarrierUp));
    }
}
