//! Scroll state and the scroll → camera mapping

use serde::{Deserialize, Serialize};

/// Camera offset used when the page cannot scroll (gallery center)
pub const DEGENERATE_RANGE_OFFSET: f32 = 0.0;

/// A smoothed scroll sample from the scroll smoother
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Smoothed scroll offset (px)
    pub offset: f32,
    /// Offset change since the previous sample (px/frame)
    pub velocity: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    pub offset: f32,
    pub velocity: f32,
    /// Total scrollable distance (document height minus viewport height)
    pub total_range: f32,
}

impl ScrollState {
    /// Scroll progress in `[0, 1]`, or `None` when the range is unusable
    pub fn fraction(&self) -> Option<f32> {
        if self.total_range.is_finite() && self.total_range > 0.0 && self.offset.is_finite() {
            Some((self.offset / self.total_range).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// Owns [`ScrollState`] and turns scroll samples into camera and spin input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollController {
    state: ScrollState,
    gallery_height: f32,
    impulse_scale: f32,
}

impl ScrollController {
    pub fn new(total_range: f32, gallery_height: f32, impulse_scale: f32) -> Self {
        Self {
            state: ScrollState {
                total_range,
                ..Default::default()
            },
            gallery_height,
            impulse_scale,
        }
    }

    #[inline]
    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    /// Record a scroll sample; returns the rotation impulse it produces
    pub fn on_scroll(&mut self, event: ScrollEvent) -> f32 {
        self.state.offset = event.offset;
        self.state.velocity = event.velocity;
        event.velocity * self.impulse_scale
    }

    /// Replace the total scroll range (page re-measured after a resize)
    pub fn remeasure(&mut self, total_range: f32) {
        if total_range != self.state.total_range {
            log::debug!(
                "Scroll range re-measured: {} -> {}",
                self.state.total_range,
                total_range
            );
            self.state.total_range = total_range;
        }
    }

    /// Camera height for the current scroll position
    ///
    /// Runs from `-height/2` at the top of the page to `+height/2` at the
    /// bottom. Elastic overscroll past either end is clamped, so the camera
    /// never leaves the gallery. Returns [`DEGENERATE_RANGE_OFFSET`] when the
    /// page cannot scroll.
    pub fn camera_offset(&self) -> f32 {
        match self.state.fraction() {
            Some(fraction) => fraction * self.gallery_height - self.gallery_height / 2.0,
            None => DEGENERATE_RANGE_OFFSET,
        }
    }
}
