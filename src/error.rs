//! Unified error types for the irdac firmware.
//!
//! A single top-level `Error` enum that every subsystem converts into,
//! with one narrow enum per concern underneath.  All variants are `Copy`
//! so they can be carried through the dispatcher and runtime without
//! allocation.

use core::fmt;

use crate::app::ports::StorageError;
use crate::config::FeatureRef;
use crate::dac::registry::ChannelId;
use crate::ir::Protocol;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration rejected before deployment.
    Config(ConfigError),
    /// Analog channel write failed.
    Dac(DacError),
    /// Raw timing could not be decoded.
    Decode(DecodeFailure),
    /// A frame could not be encoded.
    Encode(EncodeError),
    /// The transmit line refused a frame.
    Transmit(TransmitError),
    /// Persistent storage failed.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Dac(e) => write!(f, "dac: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Transmit(e) => write!(f, "transmit: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Integration-time errors.  These never occur once the runtime has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Two features resolve to the same analog channel.
    DuplicateChannelClaim(ChannelId),
    /// A feature that needs a channel declares neither pin nor mode.
    MissingPinOrMode,
    /// A feature declares both pin and mode.
    BothPinAndMode,
    /// Pin is not one of the DAC pins (25, 26).
    InvalidPinForChannel(u8),
    /// Claim attempted after the registry was sealed by setup.
    RegistrySealed,
    /// More listeners than the dispatcher table can hold.
    TooManyListeners,
    /// More features of one kind than the runtime can hold.
    TooManyFeatures,
    /// More protocol codecs than the protocol table can hold.
    TooManyCodecs,
    /// A numeric parameter is out of range.  The string names the field.
    OutOfRange(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateChannelClaim(ch) => write!(f, "channel {ch:?} claimed twice"),
            Self::MissingPinOrMode => write!(f, "one of pin or channel_mode is required"),
            Self::BothPinAndMode => write!(f, "pin and channel_mode are mutually exclusive"),
            Self::InvalidPinForChannel(pin) => write!(f, "GPIO{pin} is not a DAC pin"),
            Self::RegistrySealed => write!(f, "channel registry already sealed"),
            Self::TooManyListeners => write!(f, "listener table full"),
            Self::TooManyFeatures => write!(f, "feature table full"),
            Self::TooManyCodecs => write!(f, "protocol table full"),
            Self::OutOfRange(field) => write!(f, "{field} out of range"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// One validation finding, tagged with the feature that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigIssue {
    pub feature: FeatureRef,
    pub error: ConfigError,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.feature, self.error)
    }
}

/// Maximum number of findings collected by one validation pass.
pub const MAX_CONFIG_ISSUES: usize = 16;

/// Structured result of a validation pass.  Extra findings beyond
/// [`MAX_CONFIG_ISSUES`] are counted but not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigErrors {
    issues: heapless::Vec<ConfigIssue, MAX_CONFIG_ISSUES>,
    overflow: usize,
}

impl ConfigErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: FeatureRef, error: ConfigError) {
        if self.issues.push(ConfigIssue { feature, error }).is_err() {
            self.overflow += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.overflow == 0
    }

    pub fn len(&self) -> usize {
        self.issues.len() + self.overflow
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    pub fn contains(&self, error: ConfigError) -> bool {
        self.issues.iter().any(|i| i.error == error)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> core::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} config issue(s)", self.len())?;
        for issue in &self.issues {
            write!(f, "; {issue}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Analog output errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacError {
    /// The register write was refused by the driver (ESP-IDF error code).
    WriteFailed(i32),
    /// The channel has not been configured by the hardware layer.
    NotConfigured(ChannelId),
    /// The generator already latched a failure and no longer emits.
    Faulted,
}

impl fmt::Display for DacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed(rc) => write!(f, "DAC write failed (rc={rc})"),
            Self::NotConfigured(ch) => write!(f, "DAC channel {ch:?} not configured"),
            Self::Faulted => write!(f, "generator faulted"),
        }
    }
}

impl From<DacError> for Error {
    fn from(e: DacError) -> Self {
        Self::Dac(e)
    }
}

// ---------------------------------------------------------------------------
// IR receive / transmit errors
// ---------------------------------------------------------------------------

/// Why a raw capture did not yield a frame.  Logged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// Capture is empty.
    Empty,
    /// Entry count does not fit the protocol.
    BadLength(usize),
    /// Entry `index` falls outside the timing tolerance.
    OutOfTolerance { index: usize },
    /// No protocol in the table recognised the capture.
    NoMatchingProtocol,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty capture"),
            Self::BadLength(n) => write!(f, "unexpected length {n}"),
            Self::OutOfTolerance { index } => write!(f, "entry {index} out of tolerance"),
            Self::NoMatchingProtocol => write!(f, "no matching protocol"),
        }
    }
}

impl From<DecodeFailure> for Error {
    fn from(e: DecodeFailure) -> Self {
        Self::Decode(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// No codec in the table handles this protocol.
    UnsupportedProtocol(Protocol),
    /// The timing sequence does not fit the raw buffer.
    BufferFull,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedProtocol(p) => write!(f, "no encoder for {p:?}"),
            Self::BufferFull => write!(f, "raw buffer full"),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// A transmission is in flight and the policy (or a full queue) refused
    /// the frame.  Recoverable.
    TransmitterBusy,
    /// The frame could not be encoded.
    Encode(EncodeError),
    /// The driver refused the pulse train (ESP-IDF error code).
    DriverFailed(i32),
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransmitterBusy => write!(f, "transmitter busy"),
            Self::Encode(e) => write!(f, "{e}"),
            Self::DriverFailed(rc) => write!(f, "driver failed (rc={rc})"),
        }
    }
}

impl From<EncodeError> for TransmitError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<TransmitError> for Error {
    fn from(e: TransmitError) -> Self {
        Self::Transmit(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
