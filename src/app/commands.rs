//! Inbound commands to the runtime.
//!
//! These represent actions requested by the outside world (a home
//! automation front end, a serial console, a test harness) that the
//! [`Runtime`](super::service::Runtime) routes to the addressed feature.

/// Commands understood by a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightCommand {
    /// Fade (or jump, with the gate off) to an intensity in 0.0-1.0.
    SetTarget(f32),
    /// Between the remembered "on" intensity and 0.
    Toggle,
    /// Colour temperature in mireds.
    SetColorTemperature(f32),
    /// Recall a preset stored in the lamp.
    PresetLoad { preset: u8, force: bool },
    /// Store the lamp's current state as a preset.
    PresetSave { preset: u8 },
    /// Write the fade-gate switch.
    SetFadeEnabled(bool),
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Route a command to light `index` (declaration order).
    Light { index: u8, command: LightCommand },
    /// Drive plain analog output `index` at a level in 0.0-1.0.
    SetOutputLevel { index: u8, level: f32 },
}
