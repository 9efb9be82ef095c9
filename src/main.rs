//! irdac firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            LogEventSink   NvsAdapter          │
//! │  (DAC + IR RX + IR TX)      (EventSink)    (Config+Storage)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Runtime (pure logic)                      │    │
//! │  │  Registry · Dispatcher · Transmitter · Features        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, bail};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info, warn};

use irdac::adapters::hardware::HardwareAdapter;
use irdac::adapters::log_sink::LogEventSink;
use irdac::adapters::nvs::NvsAdapter;
use irdac::adapters::time::MonotonicClock;
use irdac::app::ports::{ConfigPort, PulseSource};
use irdac::app::service::{Features, Runtime};
use irdac::config::DeviceConfig;
use irdac::drivers::dac::DacDriver;
use irdac::drivers::ir_rx::IrReceiver;
use irdac::drivers::ir_tx::IrTransmitter;
use irdac::error::Error;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  irdac v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new().map_err(Error::from)?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Stored config unusable ({e}), using defaults");
            DeviceConfig::default()
        }
    };

    // ── 3. Build features ─────────────────────────────────────
    let features = match Features::build(&config) {
        Ok(f) => f,
        Err(issues) => {
            for issue in issues.issues() {
                error!("config: {issue}");
            }
            bail!("configuration rejected ({} issue(s))", issues.len());
        }
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let p = Peripherals::take()?;
    let dac = DacDriver::new().map_err(Error::from)?;
    let rx = IrReceiver::new(p.rmt.channel4, p.pins.gpio14)?;
    let tx = IrTransmitter::new(p.rmt.channel0, p.pins.gpio4)?;
    let mut hw = HardwareAdapter::new(dac, rx, tx);
    let mut log_sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    // ── 5. Runtime ────────────────────────────────────────────
    let mut runtime = Runtime::new(&features, &config).map_err(Error::from)?;
    runtime.setup(&mut hw, &nvs, &mut log_sink);

    // Config is good: keep it for the next boot.
    if let Err(e) = nvs.save(&config) {
        warn!("Config not persisted ({e})");
    }

    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        while let Some(raw) = hw.receive_raw_pulses() {
            runtime.on_raw_pulses(&raw, clock.now_ms(), &mut log_sink);
        }
        runtime.tick(clock.now_ms(), &mut hw, &mut log_sink);
        FreeRtos::delay_ms(runtime.tick_interval_ms());
    }
}
