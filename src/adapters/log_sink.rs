//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  A home-automation
//! bridge would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                outputs,
                sensors,
                lights,
            } => {
                info!("START | outputs={outputs} sensors={sensors} lights={lights}");
            }
            AppEvent::ProximityChanged { sensor, state } => {
                info!("PROX  | sensor[{sensor}] -> {state:?}");
            }
            AppEvent::LightChanged {
                light,
                state,
                intensity,
            } => {
                info!("LIGHT | light[{light}] {state:?} at {:.0}%", intensity * 100.0);
            }
            AppEvent::FadeSwitchChanged { light, on } => {
                info!(
                    "FADE  | light[{light}] switch {}",
                    if *on { "ON" } else { "OFF" }
                );
            }
            AppEvent::FeatureFaulted { feature, error } => {
                warn!("FAULT | {feature}: {error}");
            }
            AppEvent::TransmitRejected { light, error } => {
                warn!("IR TX | light[{light}] frame dropped: {error}");
            }
        }
    }
}
