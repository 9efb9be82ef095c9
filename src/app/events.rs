//! Outbound application events.
//!
//! The [`Runtime`](super::service::Runtime) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, publish to a home
//! automation bus, and so on.  Only state changes are emitted; internal
//! counters stay internal.

use crate::config::FeatureRef;
use crate::control::FadeState;
use crate::error::{DacError, TransmitError};
use crate::sensors::ProximityState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Setup finished; counts of what is running.
    Started {
        outputs: u8,
        sensors: u8,
        lights: u8,
    },

    /// A proximity sensor published a (possibly initial) state.
    ProximityChanged { sensor: u8, state: ProximityState },

    /// A light's fade state machine settled or started moving.
    LightChanged {
        light: u8,
        state: FadeState,
        intensity: f32,
    },

    /// A fade-gate switch published its state.
    FadeSwitchChanged { light: u8, on: bool },

    /// A feature hit a hardware failure and stopped.
    FeatureFaulted { feature: FeatureRef, error: DacError },

    /// A light's frame could not be sent.
    TransmitRejected { light: u8, error: TransmitError },
}
