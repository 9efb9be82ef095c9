//! Sensor features built on the shared IR receiver.
//!
//! A sensor claims its DAC channel(s) at setup, emits a carrier through a
//! [`CarrierGenerator`](crate::dac::CarrierGenerator) and subscribes to
//! the [`FrameDispatcher`](crate::ir::FrameDispatcher) for its echo.

pub mod proximity;

pub use proximity::{DetectorTiming, ProximityDetector, ProximityState};
