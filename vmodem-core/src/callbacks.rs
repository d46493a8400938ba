//! Caller-supplied collaborators: where decoded bits and lifecycle events
//! go, and an optional hook for constellation-plotting diagnostics.

use crate::errors::TrainingFailure;
use crate::sample::Sample;

/// Lifecycle events a receiver or transmitter reports as the call
/// progresses, distinct from the decoded data stream itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CarrierUp,
    CarrierDown,
    TrainingSucceeded,
    TrainingFailed(TrainingFailure),
}

/// Receives decoded bits and lifecycle events from a receiver, or wants
/// to know what a transmitter is about to send. Implemented by the CLI's
/// frame/byte collector and by test harnesses.
pub trait BitSink {
    fn accept_bit(&mut self, bit: u8);

    /// Default no-op so implementors that only care about the bit stream
    /// don't have to handle events.
    fn accept_event(&mut self, _event: Event) {}
}

/// Optional diagnostic hook mirroring spandsp's `qam_report` callback:
/// fired once per received symbol with the raw equalized constellation
/// point, its sliced decision, and the current symbol timing correction.
pub trait QamReportSink {
    fn report_constellation_point(&mut self, received: Sample, decision: Sample, symbol: u32);
}

/// A `BitSink` that just collects bits into a `Vec<u8>`, useful for
/// tests and small tools that don't need byte framing.
#[derive(Debug, Default)]
pub struct BitCollector {
    pub bits: Vec<u8>,
    pub events: Vec<Event>,
}

impl BitSink for BitCollector {
    fn accept_bit(&mut self, bit: u8) {
        self.bits.push(bit);
    }

    fn accept_event(&mut self, event: Event) {
        self.events.push(event);
    }
}
