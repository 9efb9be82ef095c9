//! A remote-controlled light driven over IR.
//!
//! The light keeps a mirror of the lamp's state in a [`FadeController`]
//! and turns local changes into NEC frames for the shared transmitter.
//! Frames from the lamp's own remote update the mirror without being
//! re-sent, since the lamp already acted on them.

use heapless::Deque;
use log::{debug, info};

use super::fade_switch::FadeSwitch;
use super::remote::{self, RemoteAction};
use crate::app::capabilities::{ListensForFrames, TicksPeriodically};
use crate::app::commands::LightCommand;
use crate::config::LightConfig;
use crate::control::{FadeController, FadeState};
use crate::ir::Frame;

/// Frames waiting for the transmitter.
const OUTBOX_DEPTH: usize = 4;

/// Who issued the change currently being animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Local,
    Remote,
}

pub struct LightFeature {
    fade: FadeController,
    warmth: f32,
    /// Intensity restored by `Toggle`.
    on_intensity: f32,
    origin: Origin,
    fade_switch: Option<FadeSwitch>,
    /// Quantised state last put on the wire or heard from the remote.
    last_state_frame: Option<Frame>,
    /// Last frame handed to the transmitter, for echo suppression.  Cleared
    /// once a genuine remote frame is applied.
    last_tx: Option<Frame>,
    outbox: Deque<Frame, OUTBOX_DEPTH>,
    last_tick_ms: Option<u32>,
    reported: FadeState,
    state_changed: bool,
}

impl LightFeature {
    pub fn new(fade: FadeController, warmth: f32, fade_switch: Option<FadeSwitch>) -> Self {
        let on_intensity = if fade.intensity() > 0.0 { fade.intensity() } else { 1.0 };
        let reported = fade.state();
        let mut light = Self {
            fade,
            warmth: warmth.clamp(0.0, 1.0),
            on_intensity,
            origin: Origin::Local,
            fade_switch: None,
            last_state_frame: None,
            last_tx: None,
            outbox: Deque::new(),
            last_tick_ms: None,
            reported,
            state_changed: false,
        };
        if let Some(sw) = fade_switch {
            light.fade.set_gate(sw.state());
            light.fade_switch = Some(sw);
        }
        // The lamp is assumed to power up in the configured state.
        light.last_state_frame = Some(light.current_state_frame());
        light
    }

    pub fn from_config(index: u8, cfg: &LightConfig) -> Self {
        let fade = FadeController::new(cfg.default_intensity, cfg.fade_rate_per_sec);
        let switch = cfg
            .fade_switch
            .as_ref()
            .map(|s| FadeSwitch::new(index, s.restore_mode));
        Self::new(fade, remote::warmth_from_mireds(cfg.color_temperature), switch)
    }

    pub fn intensity(&self) -> f32 {
        self.fade.intensity()
    }

    pub fn fade_state(&self) -> FadeState {
        self.fade.state()
    }

    pub fn fade_enabled(&self) -> bool {
        self.fade.gate_enabled()
    }

    pub fn color_temperature(&self) -> f32 {
        remote::mireds_from_warmth(self.warmth)
    }

    pub fn fade_switch(&self) -> Option<&FadeSwitch> {
        self.fade_switch.as_ref()
    }

    pub fn fade_switch_mut(&mut self) -> Option<&mut FadeSwitch> {
        self.fade_switch.as_mut()
    }

    /// Re-read the gate from the switch (after it was restored).
    pub fn sync_gate(&mut self) {
        if let Some(on) = self.fade_switch.as_ref().map(FadeSwitch::state) {
            self.fade.set_gate(on);
        }
    }

    /// Apply a local command.
    pub fn handle(&mut self, cmd: LightCommand) {
        match cmd {
            LightCommand::SetTarget(target) => {
                self.origin = Origin::Local;
                if target > 0.0 {
                    self.on_intensity = target.min(1.0);
                }
                self.fade.set_target(target);
            }
            LightCommand::Toggle => {
                self.origin = Origin::Local;
                if self.fade.target() > 0.0 {
                    self.on_intensity = self.fade.target();
                    self.fade.set_target(0.0);
                } else {
                    self.fade.set_target(self.on_intensity);
                }
            }
            LightCommand::SetColorTemperature(mireds) => {
                self.origin = Origin::Local;
                self.warmth = remote::warmth_from_mireds(mireds);
            }
            LightCommand::PresetLoad { preset, force } => {
                info!("light: loading preset {}", preset % 16);
                self.send(remote::preset_load_frame(preset, force));
            }
            LightCommand::PresetSave { preset } => {
                info!("light: saving preset {}", preset % 16);
                self.send(remote::preset_save_frame(preset));
            }
            LightCommand::SetFadeEnabled(on) => {
                let on = match self.fade_switch.as_mut() {
                    Some(sw) => sw.write_state(on),
                    None => on,
                };
                self.fade.set_gate(on);
            }
        }
        self.after_change();
    }

    /// Pop the next frame for the transmitter.
    pub fn take_outgoing(&mut self) -> Option<Frame> {
        self.outbox.pop_front()
    }

    /// Settled-state change since the last call, with the intensity.
    pub fn take_state_change(&mut self) -> Option<(FadeState, f32)> {
        if !self.state_changed {
            return None;
        }
        self.state_changed = false;
        Some((self.fade.state(), self.fade.intensity()))
    }

    fn apply_remote(&mut self, action: RemoteAction, frame: &Frame) {
        match action {
            RemoteAction::Set {
                brightness, warmth, ..
            } => {
                self.origin = Origin::Remote;
                self.warmth = warmth;
                if brightness > 0.0 {
                    self.on_intensity = brightness;
                }
                self.fade.set_target(brightness);
                self.last_state_frame = Some(*frame);
            }
            RemoteAction::PowerOff => {
                self.origin = Origin::Remote;
                self.fade.set_target(0.0);
                self.last_state_frame = Some(*frame);
            }
            RemoteAction::PresetLoad { preset, .. } => {
                // The lamp's preset contents are unknown here.
                debug!("light: remote recalled preset {preset}");
            }
            RemoteAction::PresetSave { preset } => {
                debug!("light: remote stored preset {preset}");
            }
        }
        self.after_change();
    }

    fn current_state_frame(&self) -> Frame {
        remote::state_frame(self.fade.intensity(), self.warmth, self.fade.gate_enabled())
    }

    /// Emit a state frame if the quantised command moved, and note
    /// settled-state transitions.
    fn after_change(&mut self) {
        if self.origin == Origin::Local {
            let frame = self.current_state_frame();
            if self.last_state_frame != Some(frame) {
                self.last_state_frame = Some(frame);
                self.send(frame);
            }
        }
        let state = self.fade.state();
        if state != self.reported {
            self.reported = state;
            self.state_changed = true;
        }
    }

    fn send(&mut self, frame: Frame) {
        if self.outbox.is_full() {
            // Older state frames are stale once a newer one exists.
            self.outbox.pop_front();
        }
        let _ = self.outbox.push_back(frame);
        self.last_tx = Some(frame);
    }
}

impl ListensForFrames for LightFeature {
    fn matches(&self, frame: &Frame) -> bool {
        remote::is_addressed_to_light(frame)
            && !self.last_tx.is_some_and(|tx| tx.same_message(frame))
    }

    fn on_frame(&mut self, frame: &Frame, _now_ms: u32) {
        if let Some(action) = remote::interpret(frame) {
            // The remote has spoken since our last frame, so a repeat of
            // that frame is a key press, not an echo.
            self.last_tx = None;
            self.apply_remote(action, frame);
        }
    }
}

impl TicksPeriodically for LightFeature {
    fn tick(&mut self, now_ms: u32) {
        let dt_ms = self
            .last_tick_ms
            .map_or(0, |last| now_ms.wrapping_sub(last));
        self.last_tick_ms = Some(now_ms);
        if self.fade.tick(dt_ms as f32 / 1000.0) {
            self.after_change();
        }
    }
}
