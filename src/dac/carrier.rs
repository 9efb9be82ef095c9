//! Carrier generator: level output on one or both claimed DAC channels.
//!
//! Two waveforms share the same driver:
//!
//! - [`Waveform::Constant`] holds the channel at a steady level (plain
//!   analog output).
//! - [`Waveform::ProximityCarrier`] plays a gated 38 kHz square wave used
//!   as the IR proximity emitter.  At the 76 kHz sample rate the gate mask
//!   `0b1000_0100_0001` produces:
//!
//! | Bit | Period        | Half-period |
//! |-----|---------------|-------------|
//! | 0   | 2 samples     | ~13.2 µs    |
//! | 6   | 128 samples   | ~842 µs     |
//! | 11  | 4096 samples  | ~26.9 ms    |
//!
//! The 842 µs bursts are what the receiver sees when the carrier bounces
//! back (see [`crate::ir::reflection`]).
//!
//! A write failure latches the generator into [`GeneratorState::Faulted`];
//! from then on it refuses every level and no longer emits.

use log::{error, warn};

use super::registry::{ChannelMode, ClaimedChannels};
use crate::app::ports::DacPort;
use crate::error::DacError;

/// Gate mask applied to the sample phase counter.
pub const CARRIER_GATE_MASK: u32 = 0b1000_0100_0001;
/// One full cycle of the gated carrier, in samples.
pub const CARRIER_PERIOD_SAMPLES: usize = 4096;

/// Shape of the signal written to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Constant,
    ProximityCarrier,
}

impl Waveform {
    /// Output code for sample number `phase` at high level `code`.
    #[inline]
    pub fn sample(self, phase: u32, code: u8) -> u8 {
        match self {
            Self::Constant => code,
            Self::ProximityCarrier => {
                if phase & CARRIER_GATE_MASK != 0 {
                    0
                } else {
                    code
                }
            }
        }
    }
}

/// One stereo frame of the I2S DAC sample stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DacSample {
    pub right: u8,
    pub left: u8,
}

/// Fill `out` with consecutive samples starting at `phase`.  Lanes not
/// covered by `mode` are left untouched.  Returns the next phase.
pub fn render(mode: ChannelMode, waveform: Waveform, code: u8, phase: u32, out: &mut [DacSample]) -> u32 {
    let mut phase = phase;
    for s in out.iter_mut() {
        let v = waveform.sample(phase, code);
        if matches!(mode, ChannelMode::Right | ChannelMode::Both) {
            s.right = v;
        }
        if matches!(mode, ChannelMode::Left | ChannelMode::Both) {
            s.left = v;
        }
        phase = phase.wrapping_add(1);
    }
    phase
}

/// Normalised level → 8-bit DAC code.  Out-of-range input is clamped;
/// NaN maps to zero.
pub fn level_to_code(level: f32) -> u8 {
    if level.is_nan() {
        return 0;
    }
    (level.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Nothing written yet.
    Idle,
    Emitting { code: u8 },
    /// Terminal.
    Faulted(DacError),
}

pub struct CarrierGenerator {
    channels: ClaimedChannels,
    waveform: Waveform,
    state: GeneratorState,
}

impl CarrierGenerator {
    pub fn new(channels: ClaimedChannels, waveform: Waveform) -> Self {
        Self {
            channels,
            waveform,
            state: GeneratorState::Idle,
        }
    }

    /// Write `level` to every claimed channel.  `BOTH` writes the same code
    /// to RIGHT then LEFT within this call.
    pub fn set_level(&mut self, dac: &mut impl DacPort, level: f32) -> Result<(), DacError> {
        if let GeneratorState::Faulted(_) = self.state {
            return Err(DacError::Faulted);
        }

        let code = level_to_code(level);
        let channels = self.channels;
        for ch in channels.iter() {
            if let Err(e) = dac.write_channel_level(ch, code, self.waveform) {
                self.fault_shutdown(dac, e);
                return Err(e);
            }
        }
        self.state = GeneratorState::Emitting { code };
        Ok(())
    }

    /// Latch the fault and make a best-effort attempt to silence the
    /// channels.
    fn fault_shutdown(&mut self, dac: &mut impl DacPort, cause: DacError) {
        let channels = self.channels;
        error!("dac: write failed on {:?}: {}", channels.mode(), cause);
        for ch in channels.iter() {
            if dac.write_channel_level(ch, 0, Waveform::Constant).is_err() {
                warn!("dac: could not silence {:?}", ch);
            }
        }
        self.state = GeneratorState::Faulted(cause);
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.state, GeneratorState::Faulted(_))
    }

    pub fn is_emitting(&self) -> bool {
        matches!(self.state, GeneratorState::Emitting { code } if code > 0)
    }

    /// Current 8-bit output code (0 unless emitting).
    pub fn code(&self) -> u8 {
        match self.state {
            GeneratorState::Emitting { code } => code,
            _ => 0,
        }
    }

    pub fn channels(&self) -> ClaimedChannels {
        self.channels
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}
