//! Frame dispatcher: one physical receiver, many listeners.
//!
//! Listeners are registered during setup as non-owning
//! `&RefCell<dyn ListensForFrames>` references and kept in registration
//! order.  After [`FrameDispatcher::seal`] the table is frozen; the
//! receive path (`on_raw_pulses` → `decode` → `dispatch`) neither
//! allocates nor blocks.

use core::cell::RefCell;

use log::{debug, warn};

use super::codec::ProtocolTable;
use super::Frame;
use crate::app::capabilities::ListensForFrames;
use crate::error::{ConfigError, DecodeFailure};

/// Capacity of the listener table.
pub const MAX_LISTENERS: usize = 8;

/// A registered listener.  The dispatcher never owns the feature.
pub type Listener<'a> = &'a RefCell<dyn ListensForFrames + 'a>;

/// Receive-path counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Captures that decoded into a frame.
    pub decoded: u32,
    /// Captures dropped as undecodable.
    pub decode_failures: u32,
    /// Decoded frames no listener wanted.
    pub unmatched: u32,
    /// Total `on_frame` invocations.
    pub deliveries: u32,
}

pub struct FrameDispatcher<'a> {
    table: ProtocolTable,
    listeners: heapless::Vec<Listener<'a>, MAX_LISTENERS>,
    sealed: bool,
    stats: DispatchStats,
}

impl<'a> FrameDispatcher<'a> {
    pub fn new(table: ProtocolTable) -> Self {
        Self {
            table,
            listeners: heapless::Vec::new(),
            sealed: false,
            stats: DispatchStats::default(),
        }
    }

    /// Add a listener.  Only valid before [`seal`](Self::seal).
    pub fn register(&mut self, listener: Listener<'a>) -> Result<(), ConfigError> {
        if self.sealed {
            return Err(ConfigError::RegistrySealed);
        }
        self.listeners
            .push(listener)
            .map_err(|_| ConfigError::TooManyListeners)
    }

    /// Freeze the listener table.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn table(&self) -> &ProtocolTable {
        &self.table
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Decode a raw capture using the shared protocol table.
    pub fn decode(&self, raw: &[i32]) -> Result<Frame, DecodeFailure> {
        self.table.decode(raw)
    }

    /// Hand `frame` to every listener whose predicate matches, in
    /// registration order, exactly once each.  Returns the number of
    /// listeners invoked.
    pub fn dispatch(&mut self, frame: &Frame, now_ms: u32) -> usize {
        let mut delivered = 0;
        for listener in &self.listeners {
            // A listener that is already borrowed is inside its own
            // handler; re-entering it would alias.
            let Ok(mut l) = listener.try_borrow_mut() else {
                warn!("dispatch: listener busy, frame skipped for it");
                continue;
            };
            if l.matches(frame) {
                l.on_frame(frame, now_ms);
                delivered += 1;
            }
        }
        if delivered == 0 {
            self.stats.unmatched = self.stats.unmatched.wrapping_add(1);
        }
        self.stats.deliveries = self.stats.deliveries.wrapping_add(delivered as u32);
        delivered
    }

    /// Receive path: decode, then dispatch.  Undecodable captures are
    /// logged and dropped.
    pub fn on_raw_pulses(&mut self, raw: &[i32], now_ms: u32) -> Option<Frame> {
        match self.decode(raw) {
            Ok(frame) => {
                self.stats.decoded = self.stats.decoded.wrapping_add(1);
                self.dispatch(&frame, now_ms);
                Some(frame)
            }
            Err(e) => {
                self.stats.decode_failures = self.stats.decode_failures.wrapping_add(1);
                debug!("IR RX: dropped {} entries ({e})", raw.len());
                None
            }
        }
    }
}
