//! Reflection signature of the proximity carrier.
//!
//! The proximity emitter gates its 38 kHz carrier into 842 µs bursts.
//! A demodulating receiver that catches the reflection reports a regular
//! train of 842 µs marks and spaces.  A capture counts as a reflection
//! when it holds 15 mark/space pairs and a final mark, all within
//! tolerance, followed by the receiver's idle space.

use super::codec::ProtocolCodec;
use super::timing::RawReader;
use super::{Frame, FramePayload, Protocol, RawTimings};
use crate::error::{DecodeFailure, EncodeError};

/// Half-period of the carrier gate (128 samples at 76 kHz).
pub const BURST_US: u32 = 842;
/// Marks per reflection capture.
pub const BURSTS: usize = 16;
/// Entries in a capture including the trailing idle space.
pub const CAPTURE_ENTRIES: usize = BURSTS * 2;

pub struct ReflectionCodec;

impl ProtocolCodec for ReflectionCodec {
    fn protocol(&self) -> Protocol {
        Protocol::Reflection
    }

    fn decode(&self, raw: &[i32]) -> Result<Frame, DecodeFailure> {
        // The idle space may or may not have been kept by the driver.
        if raw.len() != CAPTURE_ENTRIES && raw.len() != CAPTURE_ENTRIES - 1 {
            return Err(DecodeFailure::BadLength(raw.len()));
        }
        let mut r = RawReader::new(raw);
        for _ in 1..BURSTS {
            r.expect_item(BURST_US, BURST_US)?;
        }
        r.expect_mark(BURST_US)?;
        if !r.at_end() {
            return Err(DecodeFailure::OutOfTolerance { index: r.position() });
        }
        Ok(Frame::reflection())
    }

    fn encode(&self, frame: &Frame, out: &mut RawTimings) -> Result<(), EncodeError> {
        if frame.payload != FramePayload::Reflection {
            return Err(EncodeError::UnsupportedProtocol(frame.protocol()));
        }
        for _ in 0..BURSTS {
            out.push(BURST_US as i32).map_err(|_| EncodeError::BufferFull)?;
            out.push(-(BURST_US as i32)).map_err(|_| EncodeError::BufferFull)?;
        }
        Ok(())
    }
}
