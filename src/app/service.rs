//! Runtime: the hexagonal core.
//!
//! [`Features`] is the process-wide arena: built once from a validated
//! [`DeviceConfig`], it owns the channel registry and every feature.
//! [`Runtime`] borrows it, registers the listeners with the single
//! [`FrameDispatcher`] and owns the single [`Transmitter`].  All I/O flows
//! through port traits injected at call sites.
//!
//! ```text
//!  PulseSource ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │         Runtime           │
//!  DacPort     ◀── │ dispatcher · transmitter  │ ──▶ PulseSink
//!  StoragePort ◀─▶ └──────────────────────────┘
//! ```
//!
//! Tick order is fixed: proximity timeouts, then fade steps, then the
//! transmitter (new frames first, then the queue).

use core::cell::RefCell;

use log::{error, info, warn};

use crate::config::{DeviceConfig, FeatureRef, MAX_FEATURES};
use crate::dac::{AnalogOutput, ChannelRegistry};
use crate::error::{ConfigError, ConfigErrors, Error};
use crate::ir::{DispatchStats, Frame, FrameDispatcher, ProtocolTable, Transmitter};
use crate::light::LightFeature;
use crate::sensors::ProximityDetector;

use super::capabilities::{Outputs, TicksPeriodically};
use super::commands::{AppCommand, LightCommand};
use super::events::AppEvent;
use super::ports::{DacPort, EventSink, PulseSink, StoragePort};

// ───────────────────────────────────────────────────────────────
// Features arena
// ───────────────────────────────────────────────────────────────

/// Every feature the device runs, in declaration order.
pub struct Features {
    registry: RefCell<ChannelRegistry>,
    pub outputs: heapless::Vec<RefCell<AnalogOutput>, MAX_FEATURES>,
    pub sensors: heapless::Vec<RefCell<ProximityDetector>, MAX_FEATURES>,
    pub lights: heapless::Vec<RefCell<LightFeature>, MAX_FEATURES>,
}

impl Features {
    /// Validate `cfg`, resolve channel claims and construct the features.
    /// Nothing is built if validation reports anything.
    pub fn build(cfg: &DeviceConfig) -> Result<Self, ConfigErrors> {
        crate::config::validate(cfg)?;

        let mut errs = ConfigErrors::new();
        let mut registry = ChannelRegistry::new();
        let mut outputs = heapless::Vec::new();
        let mut sensors = heapless::Vec::new();
        let mut lights = heapless::Vec::new();

        for (me, request) in cfg.channel_requests() {
            let ch = match request.and_then(|c| registry.claim(me, c)) {
                Ok(ch) => ch,
                Err(e) => {
                    errs.push(me, e);
                    continue;
                }
            };
            let stored = match me {
                FeatureRef::Output(_) => outputs.push(RefCell::new(AnalogOutput::new(ch))).is_ok(),
                FeatureRef::Proximity(i) => match cfg.proximity.get(usize::from(i)) {
                    Some(p) => sensors
                        .push(RefCell::new(ProximityDetector::from_config(ch, p)))
                        .is_ok(),
                    None => false,
                },
                FeatureRef::Light(_) | FeatureRef::Device => true,
            };
            if !stored {
                errs.push(me, ConfigError::TooManyFeatures);
            }
        }
        for (i, l) in cfg.lights.iter().enumerate() {
            let light = LightFeature::from_config(i as u8, l);
            if lights.push(RefCell::new(light)).is_err() {
                errs.push(FeatureRef::Light(i as u8), ConfigError::TooManyFeatures);
            }
        }
        errs.into_result()?;

        Ok(Self {
            registry: RefCell::new(registry),
            outputs,
            sensors,
            lights,
        })
    }

    pub fn registry(&self) -> core::cell::Ref<'_, ChannelRegistry> {
        self.registry.borrow()
    }
}

// ───────────────────────────────────────────────────────────────
// Runtime
// ───────────────────────────────────────────────────────────────

pub struct Runtime<'a> {
    features: &'a Features,
    dispatcher: FrameDispatcher<'a>,
    transmitter: Transmitter,
    tick_interval_ms: u32,
    tick_count: u64,
    started: bool,
}

impl<'a> Runtime<'a> {
    /// Wire `features` to a fresh dispatcher and transmitter sharing one
    /// protocol table.  Listeners are registered sensors first, then
    /// lights.
    pub fn new(features: &'a Features, cfg: &DeviceConfig) -> Result<Self, ConfigError> {
        let table = ProtocolTable::standard();
        let mut dispatcher = FrameDispatcher::new(table.clone());
        for sensor in &features.sensors {
            dispatcher.register(sensor)?;
        }
        for light in &features.lights {
            dispatcher.register(light)?;
        }
        let transmitter = Transmitter::new(
            table,
            cfg.transmitter.policy,
            usize::from(cfg.transmitter.queue_depth),
        );
        Ok(Self {
            features,
            dispatcher,
            transmitter,
            tick_interval_ms: cfg.tick_interval_ms,
            tick_count: 0,
            started: false,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Seal the registry and listener table, start carriers, restore fade
    /// switches and publish every initial state.
    pub fn setup(
        &mut self,
        dac: &mut impl DacPort,
        storage: &impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        self.features.registry.borrow_mut().seal();
        self.dispatcher.seal();

        for (i, sensor) in self.features.sensors.iter().enumerate() {
            if let Err(e) = sensor.borrow_mut().start(dac) {
                sink.emit(&AppEvent::FeatureFaulted {
                    feature: FeatureRef::Proximity(i as u8),
                    error: e,
                });
            }
        }
        for light in &self.features.lights {
            let mut light = light.borrow_mut();
            if let Some(sw) = light.fade_switch_mut() {
                sw.restore(storage);
            }
            light.sync_gate();
        }

        self.publish(sink);
        for (i, light) in self.features.lights.iter().enumerate() {
            let light = light.borrow();
            sink.emit(&AppEvent::LightChanged {
                light: i as u8,
                state: light.fade_state(),
                intensity: light.intensity(),
            });
        }

        self.started = true;
        sink.emit(&AppEvent::Started {
            outputs: self.features.outputs.len() as u8,
            sensors: self.features.sensors.len() as u8,
            lights: self.features.lights.len() as u8,
        });
        info!(
            "Runtime started: {} listener(s), tick {} ms",
            self.dispatcher.listener_count(),
            self.tick_interval_ms
        );
    }

    // ── Receive path ──────────────────────────────────────────

    /// Decode one raw capture and fan it out.  Undecodable captures are
    /// dropped.
    pub fn on_raw_pulses(
        &mut self,
        raw: &[i32],
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> Option<Frame> {
        let frame = self.dispatcher.on_raw_pulses(raw, now_ms);
        if frame.is_some() {
            self.publish(sink);
        }
        frame
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Advance every state machine to `now_ms`.
    pub fn tick(&mut self, now_ms: u32, tx: &mut impl PulseSink, sink: &mut impl EventSink) {
        self.tick_count += 1;

        // 1. Proximity timeouts
        for sensor in &self.features.sensors {
            sensor.borrow_mut().tick(now_ms);
        }

        // 2. Fade steps
        for light in &self.features.lights {
            light.borrow_mut().tick(now_ms);
        }

        // 3. Transmitter: hand over new frames, then service the queue
        self.flush_outgoing(tx, sink);
        if let Err(e) = self.transmitter.poll(tx) {
            warn!("IR TX: could not start queued frame ({e})");
        }

        self.publish(sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Frames it produces go out on the
    /// next tick.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        dac: &mut impl DacPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            AppCommand::Light { index, command } => {
                let cell = self
                    .features
                    .lights
                    .get(usize::from(index))
                    .ok_or(ConfigError::OutOfRange("light index"))?;
                let mut light = cell.borrow_mut();
                light.handle(command);

                if let LightCommand::SetFadeEnabled(_) = command {
                    if let Some(sw) = light.fade_switch_mut() {
                        if let Some(on) = sw.take_published() {
                            sink.emit(&AppEvent::FadeSwitchChanged { light: index, on });
                        }
                        if let Err(e) = sw.persist(storage) {
                            warn!("fade switch {}: not saved ({e})", sw.key());
                        }
                    }
                }
            }
            AppCommand::SetOutputLevel { index, level } => {
                let cell = self
                    .features
                    .outputs
                    .get(usize::from(index))
                    .ok_or(ConfigError::OutOfRange("output index"))?;
                if let Err(e) = cell.borrow_mut().write_level(dac, level) {
                    error!("output[{index}]: stopped ({e})");
                    sink.emit(&AppEvent::FeatureFaulted {
                        feature: FeatureRef::Output(index),
                        error: e,
                    });
                    return Err(e.into());
                }
            }
        }
        self.publish(sink);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn features(&self) -> &'a Features {
        self.features
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.transmitter
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.tick_interval_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // ── Internal ──────────────────────────────────────────────

    fn flush_outgoing(&mut self, tx: &mut impl PulseSink, sink: &mut impl EventSink) {
        for (i, light) in self.features.lights.iter().enumerate() {
            loop {
                // Release the borrow before touching the transmitter.
                let Some(frame) = light.borrow_mut().take_outgoing() else {
                    break;
                };
                if let Err(e) = self.transmitter.transmit(tx, frame) {
                    sink.emit(&AppEvent::TransmitRejected {
                        light: i as u8,
                        error: e,
                    });
                }
            }
        }
    }

    /// Forward pending state changes to the sink.
    fn publish(&self, sink: &mut impl EventSink) {
        for (i, sensor) in self.features.sensors.iter().enumerate() {
            if let Some(state) = sensor.borrow_mut().take_change() {
                sink.emit(&AppEvent::ProximityChanged {
                    sensor: i as u8,
                    state,
                });
            }
        }
        for (i, light) in self.features.lights.iter().enumerate() {
            let mut light = light.borrow_mut();
            if let Some(on) = light.fade_switch_mut().and_then(|sw| sw.take_published()) {
                sink.emit(&AppEvent::FadeSwitchChanged { light: i as u8, on });
            }
            if let Some((state, intensity)) = light.take_state_change() {
                sink.emit(&AppEvent::LightChanged {
                    light: i as u8,
                    state,
                    intensity,
                });
            }
        }
    }
}
