//! GPIO / peripheral pin assignments for the ESP32 IR board.
//!
//! Single source of truth: every driver references this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Built-in DAC (8-bit, two channels)
// ---------------------------------------------------------------------------

/// DAC channel 1, the RIGHT lane of the I2S DAC sample stream.
pub const DAC_RIGHT_GPIO: u8 = 25;
/// DAC channel 2, the LEFT lane of the I2S DAC sample stream.
pub const DAC_LEFT_GPIO: u8 = 26;

// ---------------------------------------------------------------------------
// IR transceiver (RMT peripheral)
// ---------------------------------------------------------------------------

/// Demodulating IR receiver output (TSOP-style, active LOW).
pub const IR_RX_GPIO: i32 = 14;
/// IR LED driver for remote-control transmission.
pub const IR_TX_GPIO: i32 = 4;

/// RMT tick is 1 µs with the 80 MHz APB clock divided by 80.
pub const RMT_CLOCK_DIVIDER: u8 = 80;
/// Remote-control carrier frequency.
pub const IR_CARRIER_HZ: u32 = 38_000;
/// Receiver idle threshold: a space this long ends a capture.
pub const IR_RX_IDLE_US: u16 = 10_000;
/// Receiver glitch filter.
pub const IR_RX_FILTER_US: u8 = 50;

// ---------------------------------------------------------------------------
// Proximity carrier timing
// ---------------------------------------------------------------------------

/// DAC sample rate for the proximity carrier: two samples per 38 kHz cycle.
pub const CARRIER_SAMPLE_RATE_HZ: u32 = IR_CARRIER_HZ * 2;
