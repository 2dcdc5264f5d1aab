//! Gallery spin: constant idle drift plus a scroll impulse that decays

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    /// Accumulated rotation about Y, kept in [0, 2π)
    pub angle: f32,
    /// Transient scroll-induced velocity (radians/frame)
    pub impulse: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationDamper {
    state: RotationState,
    /// Idle drift (radians/frame), never damped
    base_speed: f32,
    /// Per-frame impulse multiplier in (0, 1)
    damping: f32,
}

impl RotationDamper {
    pub fn new(base_speed: f32, damping: f32) -> Self {
        Self {
            state: RotationState::default(),
            base_speed,
            damping,
        }
    }

    #[inline]
    pub fn state(&self) -> &RotationState {
        &self.state
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.state.angle
    }

    /// Replace the transient impulse with the latest scroll-derived value
    pub fn set_impulse(&mut self, impulse: f32) {
        self.state.impulse = impulse;
    }

    /// Advance one frame; returns the rotation applied this frame
    pub fn advance(&mut self) -> f32 {
        let step = self.base_speed + self.state.impulse;
        self.state.angle = (self.state.angle + step).rem_euclid(TAU);
        self.state.impulse *= self.damping;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_idle_drift_is_constant() {
        let mut damper = RotationDamper::new(0.0025, 0.92);
        for _ in 0..100 {
            assert!((damper.advance() - 0.0025).abs() < 1e-7);
        }
        assert!((damper.angle() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_impulse_decays_geometrically() {
        let mut damper = RotationDamper::new(0.0025, 0.92);
        damper.set_impulse(0.1);
        for k in 0..50 {
            let step = damper.advance();
            let expected = 0.1 * 0.92f32.powi(k);
            assert!((step - 0.0025 - expected).abs() < 1e-6, "frame {k}");
        }
        for _ in 0..1000 {
            damper.advance();
        }
        assert!(damper.state().impulse.abs() < 1e-9);
    }

    #[test]
    fn test_set_impulse_replaces() {
        let mut damper = RotationDamper::new(0.0, 0.5);
        damper.set_impulse(1.0);
        damper.set_impulse(0.2);
        assert!((damper.advance() - 0.2).abs() < 1e-7);
    }

    #[test]
    fn test_angle_wraps() {
        let mut damper = RotationDamper::new(1.0, 0.92);
        for _ in 0..20 {
            damper.advance();
            assert!(damper.angle() >= 0.0 && damper.angle() < TAU);
        }
        assert!((damper.angle() - 20.0f32.rem_euclid(TAU)).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_impulse_contribution(
            impulse in -1.0f32..1.0,
            damping in 0.5f32..0.99,
            frames in 0i32..60,
        ) {
            let mut damper = RotationDamper::new(0.0, damping);
            damper.set_impulse(impulse);
            for _ in 0..frames {
                damper.advance();
            }
            let expected = impulse * damping.powi(frames);
            prop_assert!((damper.state().impulse - expected).abs() <= 1e-5);
        }
    }
}
