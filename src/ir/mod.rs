//! Infrared receive / transmit engine.
//!
//! ```text
//!  RMT RX ──raw──▶ FrameDispatcher ──decode──▶ Frame ──fan-out──▶ listeners
//!                        │                                        (proximity,
//!                 ProtocolTable                                    lights, ...)
//!                        │
//!  RMT TX ◀──raw── Transmitter ◀──encode── Frame ◀── lights
//! ```
//!
//! Raw timings follow the usual remote-receiver convention: signed
//! microseconds, positive for a mark (carrier present), negative for a
//! space.  A capture may end with one trailing idle space.

pub mod codec;
pub mod dispatcher;
pub mod nec;
pub mod reflection;
pub mod timing;
pub mod transmitter;

pub use codec::{ProtocolCodec, ProtocolTable};
pub use dispatcher::{DispatchStats, FrameDispatcher};
pub use transmitter::{BusyPolicy, TransmitOutcome, Transmitter};

/// Longest capture the engine handles (NEC with a few repeat codes).
pub const MAX_RAW_ENTRIES: usize = 96;

/// Fixed-capacity raw timing buffer.
pub type RawTimings = heapless::Vec<i32, MAX_RAW_ENTRIES>;

/// Protocol tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Nec,
    /// The proximity carrier's burst train bouncing back.
    Reflection,
}

/// NEC payload as carried on the wire: 16-bit address, 16-bit command
/// (command byte in the low half, usually its complement in the high half).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NecData {
    pub address: u16,
    pub command: u16,
}

impl NecData {
    /// Build a standard command word from one command byte.
    pub fn with_command_byte(address: u16, command: u8) -> Self {
        Self {
            address,
            command: u16::from(command) | (u16::from(!command) << 8),
        }
    }

    /// Low byte of the command word.
    pub fn command_byte(&self) -> u8 {
        (self.command & 0xFF) as u8
    }

    /// Whether the high byte is the complement of the low byte.
    pub fn command_is_checked(&self) -> bool {
        (self.command >> 8) as u8 == !self.command_byte()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePayload {
    Nec(NecData),
    Reflection,
}

/// A decoded (or to-be-encoded) remote-control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub payload: FramePayload,
    /// Number of times the message was (or is to be) sent, at least 1.
    pub repeats: u8,
}

impl Frame {
    pub fn nec(address: u16, command: u16) -> Self {
        Self {
            payload: FramePayload::Nec(NecData { address, command }),
            repeats: 1,
        }
    }

    pub fn reflection() -> Self {
        Self {
            payload: FramePayload::Reflection,
            repeats: 1,
        }
    }

    pub fn with_repeats(mut self, repeats: u8) -> Self {
        self.repeats = repeats.max(1);
        self
    }

    pub fn protocol(&self) -> Protocol {
        match self.payload {
            FramePayload::Nec(_) => Protocol::Nec,
            FramePayload::Reflection => Protocol::Reflection,
        }
    }

    pub fn as_nec(&self) -> Option<&NecData> {
        match &self.payload {
            FramePayload::Nec(d) => Some(d),
            FramePayload::Reflection => None,
        }
    }

    /// Same message, ignoring repeat count.
    pub fn same_message(&self, other: &Frame) -> bool {
        self.payload == other.payload
    }
}
