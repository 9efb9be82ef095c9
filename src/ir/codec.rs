//! Protocol table: the per-protocol encode/decode capability.
//!
//! Each protocol implements [`ProtocolCodec`].  The receive side
//! ([`FrameDispatcher`](super::FrameDispatcher)) and the transmit side
//! ([`Transmitter`](super::Transmitter)) share one [`ProtocolTable`], so
//! anything the device can send it can also recognise.

use super::nec::NecCodec;
use super::reflection::ReflectionCodec;
use super::{Frame, Protocol, RawTimings};
use crate::error::{ConfigError, DecodeFailure, EncodeError};

/// Encode/decode for one protocol.
pub trait ProtocolCodec {
    fn protocol(&self) -> Protocol;

    /// Recognise `raw` as a frame of this protocol.
    fn decode(&self, raw: &[i32]) -> Result<Frame, DecodeFailure>;

    /// Append the timing of `frame` to `out`.
    fn encode(&self, frame: &Frame, out: &mut RawTimings) -> Result<(), EncodeError>;
}

/// Maximum number of codecs in a table.
pub const MAX_CODECS: usize = 4;

/// Codecs of [`ProtocolTable::standard`], in match priority.
const STANDARD_CODECS: [&'static dyn ProtocolCodec; 2] = [&ReflectionCodec, &NecCodec];

const _: () = assert!(STANDARD_CODECS.len() <= MAX_CODECS);

#[derive(Clone)]
pub struct ProtocolTable {
    codecs: heapless::Vec<&'static dyn ProtocolCodec, MAX_CODECS>,
}

impl ProtocolTable {
    pub fn empty() -> Self {
        Self {
            codecs: heapless::Vec::new(),
        }
    }

    /// NEC plus the proximity reflection signature.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for codec in STANDARD_CODECS {
            if let Err(e) = table.register(codec) {
                log::error!("ir: {e}");
            }
        }
        table
    }

    /// Register an extra codec.  Earlier codecs win on ambiguous captures.
    pub fn register(&mut self, codec: &'static dyn ProtocolCodec) -> Result<(), ConfigError> {
        self.codecs
            .push(codec)
            .map_err(|_| ConfigError::TooManyCodecs)
    }

    pub fn supports(&self, protocol: Protocol) -> bool {
        self.codecs.iter().any(|c| c.protocol() == protocol)
    }

    /// Try each codec in order.  When none matches, the most specific
    /// failure (anything other than a length mismatch) is reported.
    pub fn decode(&self, raw: &[i32]) -> Result<Frame, DecodeFailure> {
        if raw.is_empty() {
            return Err(DecodeFailure::Empty);
        }
        let mut best = None;
        for codec in &self.codecs {
            match codec.decode(raw) {
                Ok(frame) => return Ok(frame),
                Err(DecodeFailure::BadLength(_)) => {}
                Err(e) => {
                    best.get_or_insert(e);
                }
            }
        }
        Err(best.unwrap_or(DecodeFailure::NoMatchingProtocol))
    }

    pub fn encode(&self, frame: &Frame) -> Result<RawTimings, EncodeError> {
        let protocol = frame.protocol();
        let codec = self
            .codecs
            .iter()
            .find(|c| c.protocol() == protocol)
            .ok_or(EncodeError::UnsupportedProtocol(protocol))?;
        let mut out = RawTimings::new();
        codec.encode(frame, &mut out)?;
        Ok(out)
    }
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self::standard()
    }
}
