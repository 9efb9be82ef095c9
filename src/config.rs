//! Device configuration
//!
//! Declares which features the device runs and how they are wired.
//! Loaded from JSON at integration time or from a persisted postcard blob
//! (see [`crate::adapters::nvs`]).  [`validate`] runs before any component
//! is constructed and reports every problem at once.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::dac::{ChannelClaim, ChannelMode, ChannelRegistry};
use crate::error::{ConfigError, ConfigErrors};
use crate::ir::dispatcher::MAX_LISTENERS;
use crate::ir::transmitter::MAX_QUEUE_DEPTH;
use crate::ir::BusyPolicy;
use crate::light::fade_switch::RestoreMode;

/// Maximum features of one kind.
pub const MAX_FEATURES: usize = 4;

/// Identifies a feature by kind and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureRef {
    /// Device-wide settings.
    Device,
    Output(u8),
    Proximity(u8),
    Light(u8),
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Output(i) => write!(f, "output[{i}]"),
            Self::Proximity(i) => write!(f, "proximity[{i}]"),
            Self::Light(i) => write!(f, "light[{i}]"),
        }
    }
}

/// Whole-device configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Runtime tick period (milliseconds)
    pub tick_interval_ms: u32,
    /// Plain analog outputs
    pub outputs: Vec<AnalogOutputConfig>,
    /// Reflection proximity sensors
    pub proximity: Vec<ProximityConfig>,
    /// IR-remote lights
    pub lights: Vec<LightConfig>,
    pub transmitter: TransmitterConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20, // 50 Hz
            outputs: Vec::new(),
            proximity: Vec::new(),
            lights: Vec::new(),
            transmitter: TransmitterConfig::default(),
        }
    }
}

impl DeviceConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Channel claims in resolution order.  Each kind keeps its
    /// declaration order and kinds are resolved outputs first, then
    /// proximity sensors, since the JSON and postcard forms do not keep
    /// an order across the `outputs` and `proximity` lists.  Validation
    /// and `Features::build` both resolve claims through this list.
    pub fn channel_requests(
        &self,
    ) -> impl Iterator<Item = (FeatureRef, Result<ChannelClaim, ConfigError>)> + '_ {
        let outputs = self
            .outputs
            .iter()
            .enumerate()
            .map(|(i, o)| (FeatureRef::Output(i as u8), o.claim()));
        let sensors = self
            .proximity
            .iter()
            .enumerate()
            .map(|(i, p)| (FeatureRef::Proximity(i as u8), p.claim()));
        outputs.chain(sensors)
    }
}

// ---------------------------------------------------------------------------
// Feature sections
// ---------------------------------------------------------------------------

/// A DAC channel used as a plain analog output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogOutputConfig {
    pub name: String,
    #[serde(default)]
    pub pin: Option<u8>,
    #[serde(default)]
    pub channel_mode: Option<ChannelMode>,
}

impl AnalogOutputConfig {
    pub fn claim(&self) -> Result<ChannelClaim, ConfigError> {
        ChannelClaim::from_parts(self.pin, self.channel_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    pub name: String,
    /// IR LED driven by the DAC (25 or 26)
    #[serde(default)]
    pub led_pin: Option<u8>,
    #[serde(default)]
    pub channel_mode: Option<ChannelMode>,
    /// Carrier amplitude while sensing (0.0-1.0)
    #[serde(default = "default_sensing_level")]
    pub sensing_level: f32,
    /// Reflections needed inside the window to report DETECTED (K)
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Trailing window for counting reflections, ms (W)
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
    /// Silence after which DETECTED falls back to CLEAR, ms (T)
    #[serde(default = "default_clear_timeout_ms")]
    pub clear_timeout_ms: u32,
}

impl ProximityConfig {
    pub fn claim(&self) -> Result<ChannelClaim, ConfigError> {
        ChannelClaim::from_parts(self.led_pin, self.channel_mode)
    }
}

fn default_sensing_level() -> f32 {
    1.0
}
fn default_threshold() -> u8 {
    3
}
fn default_window_ms() -> u32 {
    500
}
fn default_clear_timeout_ms() -> u32 {
    2000
}

/// A remote-controlled light that speaks NEC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub name: String,
    /// Intensity at power-up and the first "on" intensity (0.0-1.0)
    #[serde(default = "default_intensity")]
    pub default_intensity: f32,
    /// Maximum intensity change per second while fading
    #[serde(default = "default_fade_rate")]
    pub fade_rate_per_sec: f32,
    /// Initial colour temperature in mireds
    #[serde(default = "default_mireds")]
    pub color_temperature: f32,
    #[serde(default)]
    pub fade_switch: Option<FadeSwitchConfig>,
}

fn default_intensity() -> f32 {
    1.0
}
fn default_fade_rate() -> f32 {
    0.5
}
fn default_mireds() -> f32 {
    crate::light::remote::COLD_MIREDS
}

/// The switch gating a light's fade animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeSwitchConfig {
    pub name: String,
    #[serde(default)]
    pub restore_mode: RestoreMode,
    #[serde(default = "default_fade_icon")]
    pub icon: String,
}

fn default_fade_icon() -> String {
    crate::light::fade_switch::ICON_FADE.to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitterConfig {
    pub policy: BusyPolicy,
    pub queue_depth: u8,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            policy: BusyPolicy::Queue,
            queue_depth: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

/// Check `cfg` without building anything.  Every finding is collected.
pub fn validate(cfg: &DeviceConfig) -> Result<(), ConfigErrors> {
    let mut errs = ConfigErrors::new();

    if cfg.tick_interval_ms == 0 {
        errs.push(FeatureRef::Device, ConfigError::OutOfRange("tick_interval_ms"));
    }
    let depth = usize::from(cfg.transmitter.queue_depth);
    if !(1..=MAX_QUEUE_DEPTH).contains(&depth) {
        errs.push(FeatureRef::Device, ConfigError::OutOfRange("transmitter.queue_depth"));
    }
    if cfg.outputs.len() > MAX_FEATURES {
        errs.push(FeatureRef::Output(MAX_FEATURES as u8), ConfigError::TooManyFeatures);
    }
    if cfg.proximity.len() > MAX_FEATURES {
        errs.push(FeatureRef::Proximity(MAX_FEATURES as u8), ConfigError::TooManyFeatures);
    }
    if cfg.lights.len() > MAX_FEATURES {
        errs.push(FeatureRef::Light(MAX_FEATURES as u8), ConfigError::TooManyFeatures);
    }
    if cfg.proximity.len() + cfg.lights.len() > MAX_LISTENERS {
        errs.push(FeatureRef::Device, ConfigError::TooManyListeners);
    }

    // Dry run against a scratch registry: same order, same rules.
    let mut scratch = ChannelRegistry::new();
    for (feature, claim) in cfg.channel_requests() {
        if let Err(e) = claim.and_then(|c| scratch.claim(feature, c)) {
            errs.push(feature, e);
        }
    }

    for (i, p) in cfg.proximity.iter().enumerate() {
        let me = FeatureRef::Proximity(i as u8);
        if !unit(p.sensing_level) {
            errs.push(me, ConfigError::OutOfRange("sensing_level"));
        }
        if !(1..=crate::sensors::proximity::MAX_THRESHOLD).contains(&usize::from(p.threshold)) {
            errs.push(me, ConfigError::OutOfRange("threshold"));
        }
        if p.window_ms == 0 {
            errs.push(me, ConfigError::OutOfRange("window_ms"));
        }
        if p.clear_timeout_ms < p.window_ms {
            errs.push(me, ConfigError::OutOfRange("clear_timeout_ms"));
        }
    }

    for (i, l) in cfg.lights.iter().enumerate() {
        let me = FeatureRef::Light(i as u8);
        if !unit(l.default_intensity) {
            errs.push(me, ConfigError::OutOfRange("default_intensity"));
        }
        if !(l.fade_rate_per_sec > 0.0 && l.fade_rate_per_sec.is_finite()) {
            errs.push(me, ConfigError::OutOfRange("fade_rate_per_sec"));
        }
        if !l.color_temperature.is_finite() {
            errs.push(me, ConfigError::OutOfRange("color_temperature"));
        }
    }

    errs.into_result()
}
