//! Frame driver
//!
//! The host (requestAnimationFrame on the web) calls [`RenderLoop::frame`]
//! once per display refresh. Each frame advances the scroll smoother, steps
//! the gallery state and submits the scene. Stopping takes effect at the next
//! frame boundary; a stopped loop leaves all state untouched.

use crate::error::{GalleryError, GalleryResult};
use crate::gallery::{GalleryState, TickInput, tick};
use crate::platform::scroll::ScrollSmoother;
use crate::scene::{FrameView, Scene};

/// Submits a scene to the screen
pub trait FrameRenderer<T> {
    fn render(&mut self, scene: &Scene<T>, view: &FrameView) -> GalleryResult<()>;
}

pub struct RenderLoop<S> {
    state: GalleryState,
    smoother: S,
    running: bool,
    last_time: Option<f64>,
}

impl<S: ScrollSmoother> RenderLoop<S> {
    pub fn new(state: GalleryState, smoother: S) -> Self {
        Self {
            state,
            smoother,
            running: true,
            last_time: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    /// Raw scroll input goes here
    pub fn smoother_mut(&mut self) -> &mut S {
        &mut self.smoother
    }

    /// New total scroll range after the page was re-measured
    pub fn remeasure(&mut self, total_range: f32) {
        self.state.scroll.remeasure(total_range);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.state.camera.set_viewport(width, height);
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Render loop stopped after {} frames", self.state.frame);
            self.running = false;
        }
    }

    /// Run one frame at host timestamp `time_ms`
    ///
    /// Returns whether the host should schedule another frame.
    pub fn frame<T, R>(&mut self, time_ms: f64, scene: &Scene<T>, renderer: &mut R) -> bool
    where
        R: FrameRenderer<T>,
    {
        if !self.running {
            return false;
        }

        if let Some(last) = self.last_time {
            let dt = time_ms - last;
            if dt > 250.0 {
                log::debug!("Long frame gap: {:.1} ms", dt);
            }
        }
        self.last_time = Some(time_ms);

        let input = TickInput {
            scroll: self.smoother.advance(time_ms),
        };
        tick(&mut self.state, &input);

        let view = FrameView {
            camera: self.state.camera,
            gallery_rotation: self.state.gallery_rotation(),
        };
        match renderer.render(scene, &view) {
            Ok(()) => {}
            Err(GalleryError::RenderFatal(reason)) => {
                log::error!("Render failed: {}", reason);
                self.stop();
            }
            Err(e) => log::warn!("{}", e),
        }

        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::platform::scroll::LerpSmoother;

    const FRAME: f64 = 1000.0 / 60.0;

    #[derive(Default)]
    struct RecordingRenderer {
        views: Vec<FrameView>,
        fail_with: Option<fn() -> GalleryError>,
    }

    impl FrameRenderer<()> for RecordingRenderer {
        fn render(&mut self, _scene: &Scene<()>, view: &FrameView) -> GalleryResult<()> {
            self.views.push(*view);
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
    }

    fn render_loop() -> RenderLoop<LerpSmoother> {
        let config = GalleryConfig::default();
        RenderLoop::new(GalleryState::new(&config, 1000.0, 1.0), LerpSmoother::new(0.0, 0.1))
    }

    #[test]
    fn test_frames_submit_rotating_views() {
        let mut rl = render_loop();
        let scene = Scene::new();
        let mut renderer = RecordingRenderer::default();
        for i in 0..5 {
            assert!(rl.frame(i as f64 * FRAME, &scene, &mut renderer));
        }
        assert_eq!(renderer.views.len(), 5);
        assert!(renderer.views[4].gallery_rotation > renderer.views[0].gallery_rotation);
        assert_eq!(rl.state().frame, 5);
    }

    #[test]
    fn test_scroll_input_moves_camera_down() {
        let mut rl = render_loop();
        let scene = Scene::new();
        let mut renderer = RecordingRenderer::default();
        rl.frame(0.0, &scene, &mut renderer);
        let top = rl.state().camera.position.y;

        rl.smoother_mut().set_target(1000.0);
        for i in 1..=30 {
            rl.frame(i as f64 * FRAME, &scene, &mut renderer);
        }
        let camera_y = rl.state().camera.position.y;
        assert!(camera_y < top);
        // Scrolling adds spin on top of the idle drift
        assert!(rl.state().rotation.state().impulse > 0.0);
    }

    #[test]
    fn test_stopped_loop_is_inert() {
        let mut rl = render_loop();
        let scene = Scene::new();
        let mut renderer = RecordingRenderer::default();
        rl.frame(0.0, &scene, &mut renderer);
        rl.stop();

        let before = rl.state().clone();
        assert!(!rl.frame(FRAME, &scene, &mut renderer));
        assert_eq!(renderer.views.len(), 1);
        assert_eq!(rl.state().frame, before.frame);
        assert_eq!(rl.state().camera, before.camera);
        assert_eq!(rl.state().gallery_rotation(), before.gallery_rotation());
    }

    #[test]
    fn test_recoverable_render_error_keeps_running() {
        let mut rl = render_loop();
        let scene = Scene::new();
        let mut renderer = RecordingRenderer {
            fail_with: Some(|| GalleryError::Render("surface timeout".into())),
            ..Default::default()
        };
        assert!(rl.frame(0.0, &scene, &mut renderer));
        assert!(rl.is_running());
    }

    #[test]
    fn test_fatal_render_error_stops() {
        let mut rl = render_loop();
        let scene = Scene::new();
        let mut renderer = RecordingRenderer {
            fail_with: Some(|| GalleryError::RenderFatal("out of memory".into())),
            ..Default::default()
        };
        assert!(!rl.frame(0.0, &scene, &mut renderer));
        assert!(!rl.is_running());
    }

    #[test]
    fn test_remeasure_reaches_state() {
        let mut rl = render_loop();
        rl.remeasure(4000.0);
        assert_eq!(rl.state().scroll.state().total_range, 4000.0);
        rl.set_viewport(1920, 1080);
        assert!((rl.state().camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
