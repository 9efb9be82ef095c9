//! Fade controller for light intensity
//!
//! Moves intensity toward a target by at most `rate × dt` per tick and
//! lands on the target exactly.  With the fade gate disabled, targets are
//! applied in one step.

/// Where the animation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    /// Settled at intensity 0.
    Idle,
    /// Moving toward the target.
    Fading,
    /// Settled at a non-zero intensity (also the power-up state).
    Steady,
}

/// Intensity state machine
#[derive(Debug, Clone)]
pub struct FadeController {
    intensity: f32,
    target: f32,
    rate_per_sec: f32,
    gate_enabled: bool,
    state: FadeState,
}

impl FadeController {
    /// Starts STEADY at `default_intensity`, fade gate enabled.
    pub fn new(default_intensity: f32, rate_per_sec: f32) -> Self {
        let intensity = clamp_unit(default_intensity);
        Self {
            intensity,
            target: intensity,
            rate_per_sec: rate_per_sec.max(0.0),
            gate_enabled: true,
            state: FadeState::Steady,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    pub fn rate_per_sec(&self) -> f32 {
        self.rate_per_sec
    }

    pub fn gate_enabled(&self) -> bool {
        self.gate_enabled
    }

    /// Request a new intensity.  Returns `true` if anything changed.
    ///
    /// Asking for the intensity already held (or already being faded to)
    /// does nothing.
    pub fn set_target(&mut self, target: f32) -> bool {
        let target = clamp_unit(target);
        let unchanged = match self.state {
            FadeState::Fading => target == self.target,
            FadeState::Idle | FadeState::Steady => target == self.intensity,
        };
        if unchanged {
            return false;
        }

        self.target = target;
        if !self.gate_enabled || target == self.intensity {
            self.settle();
        } else {
            self.state = FadeState::Fading;
        }
        true
    }

    /// Enable or disable animation.  Disabling mid-fade jumps to the target.
    pub fn set_gate(&mut self, enabled: bool) {
        self.gate_enabled = enabled;
        if !enabled && self.state == FadeState::Fading {
            self.settle();
        }
    }

    /// Advance by `dt_secs`.  Returns `true` if the intensity moved.
    pub fn tick(&mut self, dt_secs: f32) -> bool {
        if self.state != FadeState::Fading {
            return false;
        }
        let max_step = self.rate_per_sec * dt_secs.max(0.0);
        let diff = self.target - self.intensity;
        if diff.abs() <= max_step {
            self.settle();
        } else {
            self.intensity += max_step.copysign(diff);
        }
        true
    }

    fn settle(&mut self) {
        self.intensity = self.target;
        self.state = if self.intensity == 0.0 {
            FadeState::Idle
        } else {
            FadeState::Steady
        };
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_steady_at_default() {
        let f = FadeController::new(0.6, 1.0);
        assert_eq!(f.state(), FadeState::Steady);
        assert_eq!(f.intensity(), 0.6);
    }

    #[test]
    fn fades_at_bounded_rate() {
        let mut f = FadeController::new(0.0, 0.5);
        assert!(f.set_target(1.0));
        assert_eq!(f.state(), FadeState::Fading);

        f.tick(1.0);
        assert_eq!(f.intensity(), 0.5);
        assert_eq!(f.state(), FadeState::Fading);

        f.tick(1.0);
        assert_eq!(f.intensity(), 1.0);
        assert_eq!(f.state(), FadeState::Steady);

        assert!(!f.tick(1.0));
        assert_eq!(f.intensity(), 1.0);
    }

    #[test]
    fn small_ticks_land_exactly_on_target() {
        let mut f = FadeController::new(0.0, 0.5);
        f.set_target(0.3);
        for _ in 0..1000 {
            f.tick(0.016);
        }
        assert_eq!(f.intensity(), 0.3);
        assert_eq!(f.state(), FadeState::Steady);
    }

    #[test]
    fn fading_down_to_zero_ends_idle() {
        let mut f = FadeController::new(0.5, 1.0);
        f.set_target(0.0);
        f.tick(1.0);
        assert_eq!(f.intensity(), 0.0);
        assert_eq!(f.state(), FadeState::Idle);
    }

    #[test]
    fn disabled_gate_jumps() {
        let mut f = FadeController::new(0.0, 0.5);
        f.set_gate(false);
        assert!(f.set_target(0.7));
        assert_eq!(f.intensity(), 0.7);
        assert_eq!(f.state(), FadeState::Steady);
    }

    #[test]
    fn disabling_gate_mid_fade_snaps() {
        let mut f = FadeController::new(0.0, 0.5);
        f.set_target(1.0);
        f.tick(0.5);
        f.set_gate(false);
        assert_eq!(f.intensity(), 1.0);
        assert_eq!(f.state(), FadeState::Steady);
    }

    #[test]
    fn same_target_is_a_no_op() {
        let mut f = FadeController::new(0.4, 0.5);
        assert!(!f.set_target(0.4));
        assert_eq!(f.state(), FadeState::Steady);

        f.set_target(0.9);
        f.tick(0.2);
        let mid = f.intensity();
        assert!(!f.set_target(0.9));
        assert_eq!(f.intensity(), mid);
        assert_eq!(f.state(), FadeState::Fading);
    }

    #[test]
    fn retarget_to_current_intensity_settles() {
        let mut f = FadeController::new(0.0, 0.5);
        f.set_target(1.0);
        f.tick(1.0);
        assert!(f.set_target(0.5));
        assert_eq!(f.state(), FadeState::Steady);
    }

    #[test]
    fn out_of_range_targets_clamp() {
        let mut f = FadeController::new(0.5, 0.5);
        f.set_gate(false);
        f.set_target(3.0);
        assert_eq!(f.intensity(), 1.0);
        f.set_target(-1.0);
        assert_eq!(f.intensity(), 0.0);
        assert_eq!(f.state(), FadeState::Idle);
    }
}
