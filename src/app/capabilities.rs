//! Capability traits a feature implements selectively.
//!
//! | Feature            | Outputs | ListensForFrames | TicksPeriodically |
//! |--------------------|---------|------------------|-------------------|
//! | `AnalogOutput`     | yes     |                  |                   |
//! | `ProximityDetector`|         | yes              | yes               |
//! | `LightFeature`     |         | yes              | yes               |
//!
//! Features are composed by explicit reference: the dispatcher holds a
//! `&RefCell<dyn ListensForFrames>` per listener, the runtime holds
//! concrete references for ticking.

use crate::app::ports::DacPort;
use crate::error::DacError;
use crate::ir::Frame;

/// Drives a normalised level onto hardware.
pub trait Outputs {
    fn write_level(&mut self, dac: &mut impl DacPort, level: f32) -> Result<(), DacError>;
}

/// Subscribes to decoded frames.
///
/// `matches` is the predicate; `on_frame` runs only for matching frames,
/// synchronously inside the dispatcher's fan-out.  Neither may block or
/// allocate.
pub trait ListensForFrames {
    fn matches(&self, frame: &Frame) -> bool;
    fn on_frame(&mut self, frame: &Frame, now_ms: u32);
}

/// Advanced once per runtime tick.
pub trait TicksPeriodically {
    fn tick(&mut self, now_ms: u32);
}
