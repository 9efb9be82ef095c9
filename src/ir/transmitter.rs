//! Transmit encoder: single owner of the IR transmit line.
//!
//! A frame is encoded through the shared [`ProtocolTable`] and handed to
//! the [`PulseSink`].  While the sink reports a transmission in flight,
//! further frames either wait in a bounded FIFO or are refused with
//! [`TransmitError::TransmitterBusy`], depending on [`BusyPolicy`].
//! There is no cancellation: a started transmission always completes.

use heapless::Deque;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::codec::ProtocolTable;
use super::{Frame, RawTimings};
use crate::app::ports::PulseSink;
use crate::error::{EncodeError, TransmitError};

/// Hard upper bound of the transmit queue.
pub const MAX_QUEUE_DEPTH: usize = 8;

/// What to do with a frame while the line is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    #[default]
    Queue,
    Reject,
}

/// How a successful `transmit` call was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// The pulse train is on the wire.
    Started,
    /// Waiting behind `ahead` earlier frames (including the one in flight).
    Queued { ahead: usize },
}

pub struct Transmitter {
    table: ProtocolTable,
    policy: BusyPolicy,
    depth: usize,
    queue: Deque<Frame, MAX_QUEUE_DEPTH>,
    sent: u32,
    rejected: u32,
}

impl Transmitter {
    /// `depth` is clamped to `1..=MAX_QUEUE_DEPTH`.
    pub fn new(table: ProtocolTable, policy: BusyPolicy, depth: usize) -> Self {
        Self {
            table,
            policy,
            depth: depth.clamp(1, MAX_QUEUE_DEPTH),
            queue: Deque::new(),
            sent: 0,
            rejected: 0,
        }
    }

    pub fn policy(&self) -> BusyPolicy {
        self.policy
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Raw timing of `frame` using the same table the receiver decodes with.
    pub fn encode(&self, frame: &Frame) -> Result<RawTimings, EncodeError> {
        self.table.encode(frame)
    }

    /// Send `frame`, or queue / refuse it if the line is taken.
    ///
    /// Encoding happens up front so an unencodable frame is reported
    /// immediately instead of poisoning the queue.
    pub fn transmit(
        &mut self,
        sink: &mut impl PulseSink,
        frame: Frame,
    ) -> Result<TransmitOutcome, TransmitError> {
        let raw = self.encode(&frame)?;

        // FIFO: nothing may overtake frames already waiting.
        if !sink.is_busy() && self.queue.is_empty() {
            self.start(sink, &raw)?;
            return Ok(TransmitOutcome::Started);
        }

        match self.policy {
            BusyPolicy::Reject => {
                self.rejected = self.rejected.wrapping_add(1);
                warn!("IR TX: busy, {:?} frame rejected", frame.protocol());
                Err(TransmitError::TransmitterBusy)
            }
            BusyPolicy::Queue => {
                if self.queue.len() >= self.depth || self.queue.push_back(frame).is_err() {
                    self.rejected = self.rejected.wrapping_add(1);
                    warn!("IR TX: queue full ({}), frame dropped", self.depth);
                    return Err(TransmitError::TransmitterBusy);
                }
                debug!("IR TX: queued, {} pending", self.queue.len());
                Ok(TransmitOutcome::Queued {
                    ahead: self.queue.len(),
                })
            }
        }
    }

    /// Start the next queued frame once the line is free.  Returns `true`
    /// if a transmission was started.  A frame the sink refuses stays at
    /// the head of the queue for the next poll.
    pub fn poll(&mut self, sink: &mut impl PulseSink) -> Result<bool, TransmitError> {
        if sink.is_busy() {
            return Ok(false);
        }
        let Some(frame) = self.queue.front() else {
            return Ok(false);
        };
        let raw = match self.encode(frame) {
            Ok(raw) => raw,
            Err(e) => {
                self.queue.pop_front();
                return Err(e.into());
            }
        };
        self.start(sink, &raw)?;
        self.queue.pop_front();
        Ok(true)
    }

    fn start(&mut self, sink: &mut impl PulseSink, raw: &[i32]) -> Result<(), TransmitError> {
        sink.send_raw_pulses(raw)?;
        self.sent = self.sent.wrapping_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Busy from `send` until `finish` is called.
    #[derive(Default)]
    struct Line {
        busy: bool,
        fail: bool,
        sent: Vec<Vec<i32>>,
    }

    impl Line {
        fn finish(&mut self) {
            self.busy = false;
        }
    }

    impl PulseSink for Line {
        fn send_raw_pulses(&mut self, raw: &[i32]) -> Result<(), TransmitError> {
            if self.fail {
                return Err(TransmitError::DriverFailed(-1));
            }
            self.busy = true;
            self.sent.push(raw.to_vec());
            Ok(())
        }

        fn is_busy(&self) -> bool {
            self.busy
        }
    }

    fn tx(policy: BusyPolicy, depth: usize) -> Transmitter {
        Transmitter::new(ProtocolTable::standard(), policy, depth)
    }

    #[test]
    fn idle_line_starts_immediately() {
        let mut line = Line::default();
        let mut t = tx(BusyPolicy::Queue, 4);
        assert_eq!(t.transmit(&mut line, Frame::nec(1, 2)), Ok(TransmitOutcome::Started));
        assert_eq!(line.sent.len(), 1);
        assert_eq!(t.sent(), 1);
    }

    #[test]
    fn queue_policy_is_fifo() {
        let mut line = Line::default();
        let mut t = tx(BusyPolicy::Queue, 4);
        let table = ProtocolTable::standard();
        t.transmit(&mut line, Frame::nec(1, 1)).unwrap();
        assert_eq!(
            t.transmit(&mut line, Frame::nec(2, 2)),
            Ok(TransmitOutcome::Queued { ahead: 1 })
        );
        t.transmit(&mut line, Frame::nec(3, 3)).unwrap();

        assert_eq!(t.poll(&mut line), Ok(false));
        line.finish();
        assert_eq!(t.poll(&mut line), Ok(true));
        line.finish();
        assert_eq!(t.poll(&mut line), Ok(true));

        let order: Vec<_> = line
            .sent
            .iter()
            .map(|raw| table.decode(raw).unwrap())
            .collect();
        assert_eq!(order, vec![Frame::nec(1, 1), Frame::nec(2, 2), Frame::nec(3, 3)]);
    }

    #[test]
    fn frames_do_not_overtake_the_queue() {
        let mut line = Line::default();
        let mut t = tx(BusyPolicy::Queue, 4);
        t.transmit(&mut line, Frame::nec(1, 1)).unwrap();
        t.transmit(&mut line, Frame::nec(2, 2)).unwrap();
        line.finish();
        // Line idle but one frame still waiting: the new one goes behind it.
        assert!(matches!(
            t.transmit(&mut line, Frame::nec(3, 3)),
            Ok(TransmitOutcome::Queued { .. })
        ));
        assert_eq!(t.pending(), 2);
    }

    #[test]
    fn full_queue_reports_busy() {
        let mut line = Line::default();
        let mut t = tx(BusyPolicy::Queue, 1);
        t.transmit(&mut line, Frame::nec(1, 1)).unwrap();
        t.transmit(&mut line, Frame::nec(2, 2)).unwrap();
        assert_eq!(
            t.transmit(&mut line, Frame::nec(3, 3)),
            Err(TransmitError::TransmitterBusy)
        );
        assert_eq!(t.rejected(), 1);
    }

    #[test]
    fn reject_policy_refuses_while_busy() {
        let mut line = Line::default();
        let mut t = tx(BusyPolicy::Reject, 4);
        t.transmit(&mut line, Frame::reflection()).unwrap();
        assert_eq!(
            t.transmit(&mut line, Frame::nec(1, 1)),
            Err(TransmitError::TransmitterBusy)
        );
        assert_eq!(t.pending(), 0);
        line.finish();
        assert_eq!(t.transmit(&mut line, Frame::nec(1, 1)), Ok(TransmitOutcome::Started));
    }

    #[test]
    fn unsupported_protocol_is_an_encode_error() {
        let mut line = Line::default();
        let mut t = Transmitter::new(ProtocolTable::empty(), BusyPolicy::Queue, 4);
        assert!(matches!(
            t.transmit(&mut line, Frame::nec(1, 1)),
            Err(TransmitError::Encode(EncodeError::UnsupportedProtocol(_)))
        ));
        assert!(line.sent.is_empty());
    }

    #[test]
    fn refused_start_keeps_frame_queued() {
        let mut line = Line::default();
        let mut t = tx(BusyPolicy::Queue, 4);
        t.transmit(&mut line, Frame::nec(1, 1)).unwrap();
        t.transmit(&mut line, Frame::nec(2, 2)).unwrap();
        line.finish();
        line.fail = true;
        assert_eq!(t.poll(&mut line), Err(TransmitError::DriverFailed(-1)));
        assert_eq!(t.pending(), 1);

        line.fail = false;
        assert_eq!(t.poll(&mut line), Ok(true));
        assert_eq!(t.pending(), 0);
        let table = ProtocolTable::standard();
        assert_eq!(table.decode(&line.sent[1]), Ok(Frame::nec(2, 2)));
    }
}
