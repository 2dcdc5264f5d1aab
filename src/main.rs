//! Cylinder Gallery entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_gallery {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use cylinder_gallery::assembly::{GalleryAssembler, ImagePicker};
    use cylinder_gallery::gallery::{GalleryState, curved_panel, plan_layout};
    use cylinder_gallery::platform::scroll::{LerpSmoother, ScrollSmoother};
    use cylinder_gallery::platform::web::{self, WebTextureLoader};
    use cylinder_gallery::renderer::pipeline::surface_size;
    use cylinder_gallery::renderer::{GalleryRenderer, GpuTexture};
    use cylinder_gallery::{GalleryConfig, GalleryError, GalleryResult, RenderLoop, Scene, SharedScene};

    /// Gallery instance holding all per-page state
    struct Gallery {
        render_loop: RenderLoop<LerpSmoother>,
        renderer: GalleryRenderer,
        scene: SharedScene<GpuTexture>,
    }

    /// Backing-store size of the canvas in device pixels
    fn canvas_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        surface_size(canvas.client_width(), canvas.client_height(), window.device_pixel_ratio())
    }

    pub async fn run() -> GalleryResult<()> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| GalleryError::Platform(format!("Failed to init logger: {e}")))?;

        log::info!("Cylinder Gallery starting...");

        let config = GalleryConfig::load()?;

        let window = web_sys::window().ok_or_else(|| GalleryError::Platform("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| GalleryError::Platform("no document".into()))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| GalleryError::Platform("no canvas".into()))?
            .dyn_into()
            .map_err(|_| GalleryError::Platform("#canvas is not a canvas".into()))?;

        let (width, height) = canvas_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| GalleryError::Platform(format!("Failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GalleryError::Platform(format!("Failed to get adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let renderer = GalleryRenderer::new(surface, &adapter, width, height).await?;
        let factory = renderer.texture_factory();

        // Geometry and layout are ready before the first frame; textures stream in
        let seed = config.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mesh = Rc::new(curved_panel(
            config.panel_width,
            config.panel_height,
            config.cylinder_radius,
            config.panel_segments,
        )?);
        let layout = plan_layout(&config.layout_params(), &mut rng)?;
        log::info!("Planned {} blocks with seed: {}", layout.len(), seed);

        // Start where the browser restored the page, not at the top
        let start = web::scroll_position();
        let mut state = GalleryState::new(&config, web::measure_scroll_range(), width as f32 / height as f32);
        state.restore_scroll(start);
        let smoother = LerpSmoother::new(start, config.scroll_lerp);

        let scene = SharedScene::new(Scene::new());
        let gallery = Rc::new(RefCell::new(Gallery {
            render_loop: RenderLoop::new(state, smoother),
            renderer,
            scene: scene.clone(),
        }));

        {
            let gallery = gallery.clone();
            web::on_scroll(move |position| {
                gallery.borrow_mut().render_loop.smoother_mut().set_target(position);
            })?;
        }

        {
            let gallery = gallery.clone();
            let window = window.clone();
            web::on_resize(move || {
                let (width, height) = canvas_size(&window, &canvas);
                canvas.set_width(width);
                canvas.set_height(height);
                let mut g = gallery.borrow_mut();
                g.renderer.resize(width, height);
                g.render_loop.set_viewport(width, height);
                g.render_loop.remeasure(web::measure_scroll_range());
            })?;
        }

        wasm_bindgen_futures::spawn_local(async move {
            let loader = WebTextureLoader::new(factory, config.image_url_pattern.clone(), config.texture_timeout_ms);
            let picker = ImagePicker::new(config.image_pool, rng);
            let mut assembler = GalleryAssembler::new(&loader, picker, mesh, config.assembly_policy);
            let mut graph = scene;
            assembler.assemble(&layout, &mut graph).await;
        });

        // Start frame loop
        request_animation_frame(gallery);

        log::info!("Cylinder Gallery running!");
        Ok(())
    }

    fn request_animation_frame(gallery: Rc<RefCell<Gallery>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(gallery, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(gallery: Rc<RefCell<Gallery>>, time: f64) {
        let keep_going = {
            let mut g = gallery.borrow_mut();
            let Gallery {
                render_loop,
                renderer,
                scene,
            } = &mut *g;
            let scene = scene.0.borrow();
            render_loop.frame(time, &*scene, renderer)
        };

        if keep_going {
            request_animation_frame(gallery);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    //! Runs the whole gallery without a window or network: blocks get
    //! generated solid-color textures and frames are traced to the log.

    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::rc::Rc;

    use cylinder_gallery::assembly::{GalleryAssembler, ImageId, ImagePicker, TextureLoader};
    use cylinder_gallery::gallery::{GalleryState, curved_panel, plan_layout};
    use cylinder_gallery::platform::scroll::{LerpSmoother, ScrollSmoother};
    use cylinder_gallery::scene::FrameView;
    use cylinder_gallery::{FrameRenderer, GalleryConfig, GalleryResult, RenderLoop, Scene, SharedScene};

    /// Page height minus viewport of a typical long page
    const SIMULATED_SCROLL_RANGE: f32 = 4000.0;
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const FRAMES: u32 = 600;

    /// Solid color per image id, standing in for fetched images
    struct SwatchLoader;

    impl TextureLoader for SwatchLoader {
        type Texture = Rc<image::RgbaImage>;

        async fn load(&self, id: ImageId) -> GalleryResult<Self::Texture> {
            let shade = (id.wrapping_mul(37) % 256) as u8;
            Ok(Rc::new(image::RgbaImage::from_pixel(
                4,
                4,
                image::Rgba([shade, 255 - shade, 128, 255]),
            )))
        }

        fn fallback(&self) -> Self::Texture {
            Rc::new(image::RgbaImage::from_pixel(1, 1, image::Rgba([128, 128, 128, 255])))
        }
    }

    /// Traces the pose of every submitted frame
    struct TraceRenderer;

    impl FrameRenderer<Rc<image::RgbaImage>> for TraceRenderer {
        fn render(&mut self, scene: &Scene<Rc<image::RgbaImage>>, view: &FrameView) -> GalleryResult<()> {
            log::trace!(
                "{} blocks, camera y {:.3}, rotation {:.4}",
                scene.block_count(),
                view.camera.position.y,
                view.gallery_rotation
            );
            Ok(())
        }
    }

    pub fn run() -> GalleryResult<()> {
        let config = GalleryConfig::load()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);

        let mesh = Rc::new(curved_panel(
            config.panel_width,
            config.panel_height,
            config.cylinder_radius,
            config.panel_segments,
        )?);
        log::info!(
            "Panel mesh: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        let layout = plan_layout(&config.layout_params(), &mut rng)?;
        log::info!("Planned {} blocks with seed: {}", layout.len(), seed);

        let scene = SharedScene::new(Scene::new());
        let loader = SwatchLoader;
        let mut assembler = GalleryAssembler::new(
            &loader,
            ImagePicker::new(config.image_pool, rng),
            mesh,
            config.assembly_policy,
        );
        let mut graph = scene.clone();
        pollster::block_on(assembler.assemble(&layout, &mut graph));

        let state = GalleryState::new(&config, SIMULATED_SCROLL_RANGE, 16.0 / 9.0);
        let mut render_loop = RenderLoop::new(state, LerpSmoother::new(0.0, config.scroll_lerp));
        let mut renderer = TraceRenderer;

        // Scroll halfway down after one second, then to the bottom at five
        for frame in 0..FRAMES {
            match frame {
                60 => render_loop.smoother_mut().set_target(SIMULATED_SCROLL_RANGE / 2.0),
                300 => render_loop.smoother_mut().set_target(SIMULATED_SCROLL_RANGE),
                _ => {}
            }
            let time = frame as f64 * FRAME_MS;
            render_loop.frame(time, &*scene.0.borrow(), &mut renderer);

            if frame % 60 == 0 {
                let state = render_loop.state();
                log::info!(
                    "t={:.1}s fraction {:.3} camera y {:.3} rotation {:.4} impulse {:.5}",
                    time / 1000.0,
                    state.scroll.state().fraction().unwrap_or(0.0),
                    state.camera.position.y,
                    state.gallery_rotation(),
                    state.rotation.state().impulse
                );
            }
        }

        log::info!("Headless run finished after {} frames", render_loop.state().frame);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_gallery::run().await {
        web_sys::console::error_1(&format!("Cylinder Gallery failed to start: {e}").into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Cylinder Gallery (native, headless) starting...");

    if let Err(e) = headless::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
