//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Runtime (domain)
//! ```
//!
//! Driven adapters (DAC, IR receiver/transmitter, event sinks, storage)
//! implement these traits.  The [`Runtime`](super::service::Runtime)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::config::DeviceConfig;
use crate::dac::{ChannelId, Waveform};
use crate::error::{DacError, TransmitError};
use crate::ir::RawTimings;

// ───────────────────────────────────────────────────────────────
// DAC port (driven adapter: domain → analog hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the two analog channels.
pub trait DacPort {
    /// Drive `channel` at the 8-bit `level` using `waveform`.  Must not
    /// block.  An error means the hardware state is undefined.
    fn write_channel_level(
        &mut self,
        channel: ChannelId,
        level: u8,
        waveform: Waveform,
    ) -> Result<(), DacError>;
}

// ───────────────────────────────────────────────────────────────
// IR ports (driven adapters: receiver → domain, domain → transmitter)
// ───────────────────────────────────────────────────────────────

/// Read-side port of the physical IR receiver.
pub trait PulseSource {
    /// Next completed capture, if one is waiting.  Never blocks.
    fn receive_raw_pulses(&mut self) -> Option<RawTimings>;
}

/// Write-side port of the physical IR transmitter.
pub trait PulseSink {
    /// Start sending `raw`.  Returns as soon as the hardware accepted the
    /// pulse train; the transmission then runs to completion on its own.
    fn send_raw_pulses(&mut self, raw: &[i32]) -> Result<(), TransmitError>;

    /// Whether a previously started transmission is still in flight.
    fn is_busy(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST run [`crate::config::validate`] before
/// persisting; invalid configurations are rejected, not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<DeviceConfig, StorageError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &DeviceConfig) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage (switch restore state, config blob).
///
/// Keys are namespaced to prevent collisions between subsystems.  Writes
/// MUST be atomic; the ESP-IDF NVS API guarantees this per commit.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] and [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist (first boot).
    NotFound,
    /// Stored blob failed to deserialize.
    Corrupted,
    /// Configuration was rejected by the validator.
    ValidationFailed,
    /// Caller's buffer or the partition is too small.
    Full,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Corrupted => write!(f, "corrupted"),
            Self::ValidationFailed => write!(f, "validation failed"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
