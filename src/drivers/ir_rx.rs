//! IR receiver driver (RMT RX, demodulating receiver on GPIO14).
//!
//! Captures end when the line stays idle for `IR_RX_IDLE_US`, short
//! enough to split consecutive reflection bursts and NEC repeat codes into
//! separate captures.  Durations are reported in RMT ticks of 1 µs and
//! converted to signed raw timings (mark positive, space negative).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `esp_idf_hal::rmt::RxRmtDriver`, polled with a zero
//! timeout so the main loop never blocks.
//! On host/test: a FIFO of injected captures.

use crate::app::ports::PulseSource;
use crate::ir::RawTimings;

#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::{PinState, Pulse, Receive, RxRmtDriver};

/// Ring buffer size handed to the RMT driver, in items.
#[cfg(target_os = "espidf")]
const RX_RING_ITEMS: usize = 256;

/// Append one pulse to `out`.  Returns `false` once `out` is full.
fn push_pulse(out: &mut RawTimings, mark: bool, ticks: u16) -> bool {
    if ticks == 0 {
        return true;
    }
    let v = i32::from(ticks);
    out.push(if mark { v } else { -v }).is_ok()
}

#[cfg(target_os = "espidf")]
pub struct IrReceiver<'d> {
    driver: RxRmtDriver<'d>,
    pulses: [(Pulse, Pulse); RX_RING_ITEMS],
}

#[cfg(target_os = "espidf")]
impl<'d> IrReceiver<'d> {
    pub fn new(
        channel: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::rmt::RmtChannel> + 'd,
        pin: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::InputPin> + 'd,
    ) -> Result<Self, esp_idf_sys::EspError> {
        use esp_idf_hal::rmt::config::ReceiveConfig;
        use crate::pins;

        let config = ReceiveConfig::new()
            .clock_divider(pins::RMT_CLOCK_DIVIDER)
            .idle_threshold(pins::IR_RX_IDLE_US)
            .filter_ticks_thresh(pins::IR_RX_FILTER_US);
        let mut driver = RxRmtDriver::new(channel, pin, &config, RX_RING_ITEMS)?;
        driver.start()?;
        log::info!("ir_rx: RMT receiver on GPIO{}", pins::IR_RX_GPIO);
        Ok(Self {
            driver,
            pulses: [(Pulse::zero(), Pulse::zero()); RX_RING_ITEMS],
        })
    }
}

#[cfg(target_os = "espidf")]
impl PulseSource for IrReceiver<'_> {
    fn receive_raw_pulses(&mut self) -> Option<RawTimings> {
        let n = match self.driver.receive(&mut self.pulses, 0) {
            Ok(Receive::Read(n)) => n,
            Ok(Receive::Overflow(n)) => {
                log::debug!("ir_rx: capture overflow ({n} items)");
                return None;
            }
            Ok(_) => return None,
            Err(e) => {
                log::warn!("ir_rx: receive failed ({e})");
                return None;
            }
        };
        let mut raw = RawTimings::new();
        for (a, b) in &self.pulses[..n] {
            for p in [a, b] {
                // Receiver output is active LOW.
                let mark = p.pin_state == PinState::Low;
                if !push_pulse(&mut raw, mark, p.ticks.ticks()) {
                    log::debug!("ir_rx: capture longer than {} entries", raw.len());
                    return None;
                }
            }
        }
        Some(raw)
    }
}

/// Simulated receiver fed by tests or a host harness.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct IrReceiver {
    captures: std::collections::VecDeque<RawTimings>,
}

#[cfg(not(target_os = "espidf"))]
impl IrReceiver {
    pub fn new() -> Self {
        log::info!("ir_rx(sim): injected captures");
        Self::default()
    }

    /// Queue a capture given as (level, duration µs) pairs the way the
    /// hardware reports them.
    pub fn inject_levels(&mut self, levels: &[(bool, u16)]) {
        let mut raw = RawTimings::new();
        for &(mark, ticks) in levels {
            if !push_pulse(&mut raw, mark, ticks) {
                break;
            }
        }
        self.captures.push_back(raw);
    }

    /// Queue a capture already in raw timing form.
    pub fn inject(&mut self, raw: &[i32]) {
        let mut buf = RawTimings::new();
        // Truncate like the hardware ring would.
        let n = raw.len().min(buf.capacity());
        let _ = buf.extend_from_slice(&raw[..n]);
        self.captures.push_back(buf);
    }
}

#[cfg(not(target_os = "espidf"))]
impl PulseSource for IrReceiver {
    fn receive_raw_pulses(&mut self) -> Option<RawTimings> {
        self.captures.pop_front()
    }
}
