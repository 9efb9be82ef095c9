//! NEC remote-control protocol.
//!
//! ```text
//!  header        address (16 bit, LSB first)   command (16 bit)   footer
//!  9000 / 4500   560 / 560 (0) or 560 / 1690 (1)                   560
//! ```
//!
//! Extra repeats are sent as repeat codes (9000 / 2250 / 560) after an
//! inter-frame gap.

use super::codec::ProtocolCodec;
use super::timing::RawReader;
use super::{Frame, FramePayload, NecData, Protocol, RawTimings};
use crate::error::{DecodeFailure, EncodeError};

const HEADER_MARK_US: u32 = 9000;
const HEADER_SPACE_US: u32 = 4500;
const BIT_MARK_US: u32 = 560;
const ONE_SPACE_US: u32 = 1690;
const ZERO_SPACE_US: u32 = 560;
const REPEAT_SPACE_US: u32 = 2250;
/// Gap emitted before each repeat code.  Fits one RMT item.
const REPEAT_GAP_US: u32 = 30_000;
/// Shortest gap accepted in front of a repeat code.
const MIN_REPEAT_GAP_US: u32 = 10_000;

/// Header + 32 bits + footer.
pub const FRAME_ENTRIES: usize = 2 + 32 * 2 + 1;
/// Gap + repeat header + footer.
const REPEAT_ENTRIES: usize = 4;

pub struct NecCodec;

impl NecCodec {
    fn read_u16(r: &mut RawReader<'_>) -> Result<u16, DecodeFailure> {
        let mut value = 0u16;
        for bit in 0..16 {
            if r.expect_item(BIT_MARK_US, ONE_SPACE_US).is_ok() {
                value |= 1 << bit;
            } else {
                r.expect_item(BIT_MARK_US, ZERO_SPACE_US)?;
            }
        }
        Ok(value)
    }

    fn write_u16(value: u16, out: &mut RawTimings) -> Result<(), EncodeError> {
        for bit in 0..16 {
            let space = if value & (1 << bit) != 0 {
                ONE_SPACE_US
            } else {
                ZERO_SPACE_US
            };
            push_item(out, BIT_MARK_US, space)?;
        }
        Ok(())
    }
}

fn push(out: &mut RawTimings, v: i32) -> Result<(), EncodeError> {
    out.push(v).map_err(|_| EncodeError::BufferFull)
}

fn push_item(out: &mut RawTimings, mark_us: u32, space_us: u32) -> Result<(), EncodeError> {
    push(out, mark_us as i32)?;
    push(out, -(space_us as i32))
}

impl ProtocolCodec for NecCodec {
    fn protocol(&self) -> Protocol {
        Protocol::Nec
    }

    fn decode(&self, raw: &[i32]) -> Result<Frame, DecodeFailure> {
        if raw.len() < FRAME_ENTRIES {
            return Err(DecodeFailure::BadLength(raw.len()));
        }
        let mut r = RawReader::new(raw);
        // Anything without a NEC header is simply another protocol.
        if r.expect_item(HEADER_MARK_US, HEADER_SPACE_US).is_err() {
            return Err(DecodeFailure::BadLength(raw.len()));
        }
        let address = Self::read_u16(&mut r)?;
        let command = Self::read_u16(&mut r)?;
        r.expect_mark(BIT_MARK_US)?;

        let mut repeats: u8 = 1;
        while r.remaining() >= REPEAT_ENTRIES {
            let start = r.position();
            r.expect_space_at_least(MIN_REPEAT_GAP_US)
                .and_then(|()| r.expect_item(HEADER_MARK_US, REPEAT_SPACE_US))
                .and_then(|()| r.expect_mark(BIT_MARK_US))
                .map_err(|_| DecodeFailure::OutOfTolerance { index: start })?;
            repeats = repeats.saturating_add(1);
        }
        if !r.at_end() {
            return Err(DecodeFailure::BadLength(raw.len()));
        }

        Ok(Frame {
            payload: FramePayload::Nec(NecData { address, command }),
            repeats,
        })
    }

    fn encode(&self, frame: &Frame, out: &mut RawTimings) -> Result<(), EncodeError> {
        let FramePayload::Nec(data) = frame.payload else {
            return Err(EncodeError::UnsupportedProtocol(frame.protocol()));
        };
        push_item(out, HEADER_MARK_US, HEADER_SPACE_US)?;
        Self::write_u16(data.address, out)?;
        Self::write_u16(data.command, out)?;
        push(out, BIT_MARK_US as i32)?;

        for _ in 1..frame.repeats.max(1) {
            push(out, -(REPEAT_GAP_US as i32))?;
            push_item(out, HEADER_MARK_US, REPEAT_SPACE_US)?;
            push(out, BIT_MARK_US as i32)?;
        }
        Ok(())
    }
}
