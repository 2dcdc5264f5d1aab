//! Scroll smoothing
//!
//! The raw page scroll position jumps in wheel-sized steps. The smoother
//! eases a displayed offset toward it and reports the offset and its
//! per-frame velocity. It has no timer of its own: the frame loop calls
//! `advance` once per frame, so there is exactly one driver.

use crate::gallery::ScrollEvent;

/// Distance (px) below which the offset snaps onto the target
pub const SNAP_EPSILON: f32 = 0.01;
/// Reference frame length for the lerp factor (60 Hz)
const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;
/// Longest gap treated as continuous motion (e.g. after a background tab)
const MAX_FRAMES_PER_ADVANCE: f64 = 10.0;

pub trait ScrollSmoother {
    /// Latest raw scroll position from the page
    fn set_target(&mut self, target: f32);

    /// Step toward the target; `None` once settled
    fn advance(&mut self, time_ms: f64) -> Option<ScrollEvent>;
}

/// Exponential ease toward the target, independent of frame rate
#[derive(Debug, Clone)]
pub struct LerpSmoother {
    current: f32,
    target: f32,
    /// Fraction of the remaining distance covered per 60 Hz frame
    lerp: f32,
    last_time: Option<f64>,
}

impl LerpSmoother {
    pub fn new(initial: f32, lerp: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            lerp: lerp.clamp(f32::EPSILON, 1.0),
            last_time: None,
        }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}

impl ScrollSmoother for LerpSmoother {
    fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    fn advance(&mut self, time_ms: f64) -> Option<ScrollEvent> {
        let frames = match self.last_time {
            Some(last) => ((time_ms - last) / REFERENCE_FRAME_MS).clamp(0.0, MAX_FRAMES_PER_ADVANCE),
            None => 1.0,
        };
        self.last_time = Some(time_ms);

        if self.is_settled() {
            return None;
        }

        let previous = self.current;
        let remaining = self.target - self.current;
        if remaining.abs() < SNAP_EPSILON {
            self.current = self.target;
        } else {
            let factor = 1.0 - (1.0 - self.lerp).powf(frames as f32);
            self.current += remaining * factor;
        }

        Some(ScrollEvent {
            offset: self.current,
            velocity: self.current - previous,
        })
    }
}
