//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                   |
//! |------------|--------------|-------------------------------|
//! | `hardware` | DacPort      | ESP32 DAC (continuous mode)   |
//! |            | PulseSource  | RMT RX / IR receiver          |
//! |            | PulseSink    | RMT TX / IR LED               |
//! | `log_sink` | EventSink    | Serial log output             |
//! | `nvs`      | ConfigPort   | NVS / in-memory store         |
//! |            | StoragePort  |                               |
//! | `time`     | -            | ESP32 high-resolution timer   |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
