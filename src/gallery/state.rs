//! Per-frame gallery state
//!
//! Everything the frame step mutates lives in [`GalleryState`]; nothing is
//! global. The scene graph is separate and read-only once built.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::rotation::RotationDamper;
use super::scroll::{ScrollController, ScrollEvent};
use crate::config::GalleryConfig;

/// Perspective camera looking down -Z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 1000.0;

    pub fn new(distance: f32, fov_y_deg: f32, aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, distance),
            fov_y: fov_y_deg.to_radians(),
            aspect,
            near: Self::NEAR,
            far: Self::FAR,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Update aspect ratio after a viewport resize (ignores empty viewports)
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

/// Input for one frame step
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Scroll sample produced by the smoother this frame, if it moved
    pub scroll: Option<super::ScrollEvent>,
}

/// The per-frame context passed to [`super::tick`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryState {
    pub scroll: ScrollController,
    pub rotation: RotationDamper,
    pub camera: Camera,
    /// Frames stepped so far
    pub frame: u64,
}

impl GalleryState {
    pub fn new(config: &GalleryConfig, total_scroll_range: f32, aspect: f32) -> Self {
        let mut state = Self {
            scroll: ScrollController::new(
                total_scroll_range,
                config.total_gallery_height,
                config.impulse_scale,
            ),
            rotation: RotationDamper::new(config.base_rotation_speed, config.damping_factor),
            camera: Camera::new(config.camera_distance, config.field_of_view_deg, aspect),
            frame: 0,
        };
        state.camera.position.y = -state.scroll.camera_offset();
        state
    }

    /// Start at an existing page scroll position (e.g. restored on reload)
    ///
    /// Moves the camera there directly; no rotation impulse is produced.
    pub fn restore_scroll(&mut self, offset: f32) {
        self.scroll.on_scroll(ScrollEvent {
            offset,
            velocity: 0.0,
        });
        self.camera.position.y = -self.scroll.camera_offset();
    }

    /// Current rotation of the gallery group about Y
    #[inline]
    pub fn gallery_rotation(&self) -> f32 {
        self.rotation.angle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::new(12.0, 75.0, 16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 12.0));
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
        // A point straight ahead projects to the screen center
        let clip = camera.view_projection() * glam::Vec4::new(0.0, 0.0, 6.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn test_set_viewport_ignores_zero() {
        let mut camera = Camera::new(12.0, 75.0, 1.0);
        camera.set_viewport(0, 600);
        assert_eq!(camera.aspect, 1.0);
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_initial_camera_tracks_scroll_top() {
        let config = GalleryConfig::default();
        let state = GalleryState::new(&config, 2000.0, 1.0);
        // Top of the page: camera offset -15, so the camera sits at +15
        assert!((state.camera.position.y - 15.0).abs() < 1e-5);
        assert_eq!(state.frame, 0);
    }

    #[test]
    fn test_restored_scroll_places_camera_without_spin() {
        let config = GalleryConfig::default();
        let mut state = GalleryState::new(&config, 2000.0, 1.0);
        state.restore_scroll(1000.0);
        // Halfway down: camera offset 0
        assert!(state.camera.position.y.abs() < 1e-5);
        assert_eq!(state.rotation.state().impulse, 0.0);
        assert_eq!(state.scroll.state().offset, 1000.0);
    }
}
