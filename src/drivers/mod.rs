//! Peripheral drivers.  Each has an ESP-IDF implementation and a host
//! simulation behind the same API.

pub mod dac;
pub mod ir_rx;
pub mod ir_tx;
