//! Rate-limited animation of light intensity.

pub mod fade;

pub use fade::{FadeController, FadeState};
