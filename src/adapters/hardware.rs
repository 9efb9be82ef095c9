//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the DAC, IR receiver and IR transmitter drivers and exposes them
//! through [`DacPort`], [`PulseSource`] and [`PulseSink`].  This is the
//! only module in the system that touches actual hardware.  On non-espidf
//! targets the underlying drivers are cfg-gated simulations.

use crate::app::ports::{DacPort, PulseSink, PulseSource};
use crate::dac::{ChannelId, Waveform};
use crate::drivers::dac::DacDriver;
use crate::drivers::ir_rx::IrReceiver;
use crate::drivers::ir_tx::IrTransmitter;
use crate::error::{DacError, TransmitError};
use crate::ir::RawTimings;

#[cfg(target_os = "espidf")]
type Rx = IrReceiver<'static>;
#[cfg(not(target_os = "espidf"))]
type Rx = IrReceiver;

#[cfg(target_os = "espidf")]
type Tx = IrTransmitter<'static>;
#[cfg(not(target_os = "espidf"))]
type Tx = IrTransmitter;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    dac: DacDriver,
    rx: Rx,
    tx: Tx,
}

impl HardwareAdapter {
    pub fn new(dac: DacDriver, rx: Rx, tx: Tx) -> Self {
        Self { dac, rx, tx }
    }

    pub fn dac(&self) -> &DacDriver {
        &self.dac
    }

    pub fn receiver_mut(&mut self) -> &mut Rx {
        &mut self.rx
    }

    pub fn transmitter(&self) -> &Tx {
        &self.tx
    }

    pub fn transmitter_mut(&mut self) -> &mut Tx {
        &mut self.tx
    }
}

// ── DacPort ───────────────────────────────────────────────────

impl DacPort for HardwareAdapter {
    fn write_channel_level(
        &mut self,
        channel: ChannelId,
        level: u8,
        waveform: Waveform,
    ) -> Result<(), DacError> {
        self.dac.write_channel_level(channel, level, waveform)
    }
}

// ── IR ports ──────────────────────────────────────────────────

impl PulseSource for HardwareAdapter {
    fn receive_raw_pulses(&mut self) -> Option<RawTimings> {
        self.rx.receive_raw_pulses()
    }
}

impl PulseSink for HardwareAdapter {
    fn send_raw_pulses(&mut self, raw: &[i32]) -> Result<(), TransmitError> {
        self.tx.send_raw_pulses(raw)
    }

    fn is_busy(&self) -> bool {
        self.tx.is_busy()
    }
}
