//! IR-remote light: NEC command set, fade-gate switch and the feature
//! tying them to a [`FadeController`](crate::control::FadeController).

pub mod fade_switch;
pub mod feature;
pub mod remote;

pub use fade_switch::{FadeSwitch, RestoreMode};
pub use feature::LightFeature;
