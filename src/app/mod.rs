//! Application core: pure domain logic, zero I/O.
//!
//! Features (analog outputs, proximity sensors, lights) are built from the
//! validated configuration into a [`Features`](service::Features) arena
//! and driven by the [`Runtime`](service::Runtime).  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod capabilities;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
