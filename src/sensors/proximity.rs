//! Reflection proximity detector.
//!
//! Drives the IR LED with the gated proximity carrier through its own DAC
//! channel(s) and listens for the carrier's reflection on the shared IR
//! receiver.  Presence is debounced both ways:
//!
//! - CLEAR → DETECTED the moment `threshold` reflections fall inside the
//!   trailing `window_ms`.
//! - DETECTED → CLEAR once no reflection has arrived for
//!   `clear_timeout_ms`, checked on tick.
//!
//! Timestamps are wrapping `u32` milliseconds; all comparisons go through
//! `wrapping_sub`, so the 49-day rollover is harmless.

use heapless::Deque;
use log::{error, info};

use crate::app::capabilities::{ListensForFrames, TicksPeriodically};
use crate::app::ports::DacPort;
use crate::config::ProximityConfig;
use crate::dac::{CarrierGenerator, ClaimedChannels, Waveform};
use crate::error::DacError;
use crate::ir::{Frame, Protocol};

/// Upper bound for the reflection threshold K.
pub const MAX_THRESHOLD: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityState {
    Clear,
    Detected,
}

impl ProximityState {
    pub fn is_detected(self) -> bool {
        self == Self::Detected
    }
}

/// Debounce parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorTiming {
    pub threshold: usize,
    pub window_ms: u32,
    pub clear_timeout_ms: u32,
}

impl From<&ProximityConfig> for DetectorTiming {
    fn from(cfg: &ProximityConfig) -> Self {
        Self {
            threshold: usize::from(cfg.threshold).clamp(1, MAX_THRESHOLD),
            window_ms: cfg.window_ms,
            clear_timeout_ms: cfg.clear_timeout_ms,
        }
    }
}

pub struct ProximityDetector {
    carrier: CarrierGenerator,
    sensing_level: f32,
    timing: DetectorTiming,
    /// Reflection timestamps inside the trailing window, oldest first.
    hits: Deque<u32, MAX_THRESHOLD>,
    last_hit_ms: Option<u32>,
    state: ProximityState,
    /// State change not yet collected by the runtime.
    pending: Option<ProximityState>,
}

impl ProximityDetector {
    pub fn new(channels: ClaimedChannels, sensing_level: f32, timing: DetectorTiming) -> Self {
        Self {
            carrier: CarrierGenerator::new(channels, Waveform::ProximityCarrier),
            sensing_level,
            timing,
            hits: Deque::new(),
            last_hit_ms: None,
            state: ProximityState::Clear,
            pending: None,
        }
    }

    pub fn from_config(channels: ClaimedChannels, cfg: &ProximityConfig) -> Self {
        Self::new(channels, cfg.sensing_level, DetectorTiming::from(cfg))
    }

    /// Start the carrier and publish the initial CLEAR state.
    pub fn start(&mut self, dac: &mut impl DacPort) -> Result<(), DacError> {
        self.pending = Some(ProximityState::Clear);
        match self.carrier.set_level(dac, self.sensing_level) {
            Ok(()) => {
                info!(
                    "proximity: carrier on {:?} at {:.2}",
                    self.carrier.channels().mode(),
                    self.sensing_level
                );
                Ok(())
            }
            Err(e) => {
                error!("proximity: carrier failed ({e}), detector stopped");
                Err(e)
            }
        }
    }

    pub fn state(&self) -> ProximityState {
        self.state
    }

    /// A detector whose carrier failed no longer senses anything.
    pub fn is_faulted(&self) -> bool {
        self.carrier.is_faulted()
    }

    pub fn carrier(&self) -> &CarrierGenerator {
        &self.carrier
    }

    /// Collect the last unpublished state change.
    pub fn take_change(&mut self) -> Option<ProximityState> {
        self.pending.take()
    }

    /// Record one reflection at `now_ms`.
    pub fn on_reflection(&mut self, now_ms: u32) {
        if self.is_faulted() {
            return;
        }
        self.last_hit_ms = Some(now_ms);

        while let Some(&oldest) = self.hits.front() {
            if now_ms.wrapping_sub(oldest) < self.timing.window_ms {
                break;
            }
            self.hits.pop_front();
        }
        // Only the newest `threshold` hits can ever matter.
        if self.hits.len() >= self.timing.threshold {
            self.hits.pop_front();
        }
        let _ = self.hits.push_back(now_ms);

        if self.state == ProximityState::Clear && self.hits.len() >= self.timing.threshold {
            self.transition(ProximityState::Detected);
        }
    }

    /// Timeout check.  Falls back to CLEAR after `clear_timeout_ms` of
    /// silence.
    pub fn check_timeout(&mut self, now_ms: u32) {
        if self.state != ProximityState::Detected {
            return;
        }
        let Some(last) = self.last_hit_ms else {
            return;
        };
        if now_ms.wrapping_sub(last) >= self.timing.clear_timeout_ms {
            self.hits.clear();
            self.transition(ProximityState::Clear);
        }
    }

    fn transition(&mut self, to: ProximityState) {
        log::debug!("proximity: {:?} -> {:?}", self.state, to);
        self.state = to;
        self.pending = Some(to);
    }
}

impl ListensForFrames for ProximityDetector {
    fn matches(&self, frame: &Frame) -> bool {
        frame.protocol() == Protocol::Reflection && !self.is_faulted()
    }

    fn on_frame(&mut self, _frame: &Frame, now_ms: u32) {
        self.on_reflection(now_ms);
    }
}

impl TicksPeriodically for ProximityDetector {
    fn tick(&mut self, now_ms: u32) {
        self.check_timeout(now_ms);
    }
}
