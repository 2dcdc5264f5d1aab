//! Browser glue: image fetching, page measurement, DOM listeners

use futures_util::future::{self, Either};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::assembly::{ImageId, TextureLoader, image_url};
use crate::error::{GalleryError, GalleryResult};
use crate::renderer::{GpuTexture, TextureFactory};

/// Fetches gallery images over HTTP and uploads them as textures
pub struct WebTextureLoader {
    factory: TextureFactory,
    url_pattern: String,
    timeout_ms: u32,
    fallback: GpuTexture,
}

impl WebTextureLoader {
    pub fn new(factory: TextureFactory, url_pattern: impl Into<String>, timeout_ms: u32) -> Self {
        let fallback = factory.placeholder();
        Self {
            factory,
            url_pattern: url_pattern.into(),
            timeout_ms,
            fallback,
        }
    }
}

impl TextureLoader for WebTextureLoader {
    type Texture = GpuTexture;

    async fn load(&self, id: ImageId) -> GalleryResult<GpuTexture> {
        let url = image_url(&self.url_pattern, id);

        let fetch = Box::pin(fetch_bytes(&url));
        let timeout = Box::pin(sleep(self.timeout_ms));
        let bytes = match future::select(fetch, timeout).await {
            Either::Left((result, _)) => result.map_err(|reason| GalleryError::TextureLoad { id, reason })?,
            Either::Right(((), _)) => {
                return Err(GalleryError::TextureLoad {
                    id,
                    reason: format!("{} timed out after {} ms", url, self.timeout_ms),
                });
            }
        };

        let image = image::load_from_memory(&bytes)?;
        log::debug!("Decoded {} ({}x{})", url, image.width(), image.height());
        if image.width() == 0 || image.height() == 0 {
            return Err(GalleryError::TextureLoad {
                id,
                reason: format!("{} decoded to an empty image", url),
            });
        }
        Ok(self.factory.create(&image, &url))
    }

    fn fallback(&self) -> GpuTexture {
        self.fallback.clone()
    }
}

fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let window = web_sys::window().ok_or("no window")?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    if !response.ok() {
        return Err(format!("{} returned HTTP {}", url, response.status()));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Resolves after `ms` milliseconds
async fn sleep(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                &resolve,
                ms.min(i32::MAX as u32) as i32,
            );
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Scrollable distance of the page in pixels (document height minus viewport)
pub fn measure_scroll_range() -> f32 {
    let Some(window) = web_sys::window() else {
        return 0.0;
    };
    let viewport = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let document_height = window
        .document()
        .and_then(|d| d.document_element())
        .map(|el| el.scroll_height() as f64)
        .unwrap_or(0.0);
    (document_height - viewport).max(0.0) as f32
}

/// Current vertical scroll position of the page
pub fn scroll_position() -> f32 {
    web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0) as f32
}

/// Call `on_scroll` with the page scroll position on every scroll event
pub fn on_scroll(mut on_scroll: impl FnMut(f32) + 'static) -> GalleryResult<()> {
    listen("scroll", move |_| on_scroll(scroll_position()))
}

/// Call `on_resize` on every window resize
pub fn on_resize(mut on_resize: impl FnMut() + 'static) -> GalleryResult<()> {
    listen("resize", move |_| on_resize())
}

fn listen(event: &str, handler: impl FnMut(web_sys::Event) + 'static) -> GalleryResult<()> {
    let window = web_sys::window().ok_or_else(|| GalleryError::Platform("no window".into()))?;
    let closure = Closure::<dyn FnMut(_)>::new(handler);
    window
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|e| GalleryError::Platform(format!("{} listener: {}", event, js_error(e))))?;
    // Listeners live for the page lifetime
    closure.forget();
    Ok(())
}
