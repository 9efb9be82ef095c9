//! Mock adapters for integration tests.
//!
//! Records every DAC write and every pulse train so tests can assert on
//! the full history without touching real peripherals.

use std::collections::{HashMap, VecDeque};

use irdac::app::events::AppEvent;
use irdac::app::ports::{DacPort, EventSink, PulseSink, PulseSource, StorageError, StoragePort};
use irdac::dac::{ChannelId, Waveform};
use irdac::error::{DacError, TransmitError};
use irdac::ir::{Frame, ProtocolTable, RawTimings};

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub dac_writes: Vec<(ChannelId, u8, Waveform)>,
    pub fail_dac: bool,
    pub sent: Vec<Vec<i32>>,
    pub busy: bool,
    /// Finish each transmission as soon as it starts.
    pub instant_tx: bool,
    pub captures: VecDeque<RawTimings>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            instant_tx: true,
            ..Self::default()
        }
    }

    /// Hold the transmitter busy until `complete_tx`.
    pub fn manual_tx() -> Self {
        Self::default()
    }

    pub fn complete_tx(&mut self) {
        self.busy = false;
    }

    pub fn inject(&mut self, frame: &Frame) {
        let raw = ProtocolTable::standard()
            .encode(frame)
            .expect("frame must encode");
        self.captures.push_back(raw);
    }

    /// Every transmitted pulse train, decoded.
    pub fn sent_frames(&self) -> Vec<Frame> {
        let table = ProtocolTable::standard();
        self.sent
            .iter()
            .map(|raw| table.decode(raw).expect("sent frame must decode"))
            .collect()
    }
}

impl DacPort for MockHardware {
    fn write_channel_level(
        &mut self,
        channel: ChannelId,
        level: u8,
        waveform: Waveform,
    ) -> Result<(), DacError> {
        if self.fail_dac {
            return Err(DacError::WriteFailed(-1));
        }
        self.dac_writes.push((channel, level, waveform));
        Ok(())
    }
}

impl PulseSource for MockHardware {
    fn receive_raw_pulses(&mut self) -> Option<RawTimings> {
        self.captures.pop_front()
    }
}

impl PulseSink for MockHardware {
    fn send_raw_pulses(&mut self, raw: &[i32]) -> Result<(), TransmitError> {
        if self.busy {
            return Err(TransmitError::TransmitterBusy);
        }
        self.sent.push(raw.to_vec());
        self.busy = !self.instant_tx;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── MemStorage ────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStorage {
    pub entries: HashMap<(String, String), Vec<u8>>,
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .entries
            .get(&(namespace.to_owned(), key.to_owned()))
            .ok_or(StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(StorageError::Full);
        }
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.entries
            .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.entries.remove(&(namespace.to_owned(), key.to_owned()));
        Ok(())
    }
}
