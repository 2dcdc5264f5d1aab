//! Panel textures
//!
//! Images are uploaded with a full mip chain built on the CPU (WebGL2 has no
//! compute path for mip generation) and sampled trilinearly with the
//! highest anisotropy the device allows.

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::rc::Rc;

/// Highest anisotropy level WebGPU exposes
pub const MAX_ANISOTROPY: u16 = 16;
/// Edge length of the placeholder checkerboard
const PLACEHOLDER_SIZE: u32 = 8;
const PLACEHOLDER_LIGHT: [u8; 4] = [150, 150, 150, 255];
const PLACEHOLDER_DARK: [u8; 4] = [110, 110, 110, 255];

/// Number of mip levels down to 1×1
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Mip chain for an image, level 0 first
pub fn mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(image.width(), image.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(image.clone());
    for level in 1..levels {
        let width = (image.width() >> level).max(1);
        let height = (image.height() >> level).max(1);
        let previous = &chain[level as usize - 1];
        let next = image::imageops::resize(previous, width, height, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

/// Largest size within `max` on both axes, keeping the aspect ratio
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    let longest = width.max(height);
    if longest <= max {
        return (width, height);
    }
    let scale = max as f64 / longest as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

/// Neutral grey checkerboard shown when an image fails to load
pub fn placeholder_image() -> RgbaImage {
    RgbaImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba(PLACEHOLDER_LIGHT)
        } else {
            image::Rgba(PLACEHOLDER_DARK)
        }
    })
}

#[derive(Debug)]
struct GpuTextureInner {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Uploaded, mipmapped texture; cheap to clone
#[derive(Debug, Clone)]
pub struct GpuTexture(Rc<GpuTextureInner>);

impl GpuTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.0.view
    }

    pub fn size(&self) -> (u32, u32) {
        self.0.size
    }
}

/// Creates textures and the shared sampler on a device
#[derive(Clone)]
pub struct TextureFactory {
    device: Rc<wgpu::Device>,
    queue: Rc<wgpu::Queue>,
}

impl TextureFactory {
    pub fn new(device: Rc<wgpu::Device>, queue: Rc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    /// Upload a decoded image with mipmaps
    ///
    /// Images larger than the device's texture limit are downscaled first.
    pub fn create(&self, image: &DynamicImage, label: &str) -> GpuTexture {
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = fit_within(image.width(), image.height(), max);
        let rgba = image.to_rgba8();
        if (width, height) == rgba.dimensions() {
            self.upload(&rgba, label)
        } else {
            log::info!(
                "Downscaling '{}' from {}x{} to {}x{} (device limit {})",
                label,
                rgba.width(),
                rgba.height(),
                width,
                height,
                max
            );
            self.upload(&image::imageops::resize(&rgba, width, height, FilterType::Triangle), label)
        }
    }

    pub fn placeholder(&self) -> GpuTexture {
        self.upload(&placeholder_image(), "placeholder")
    }

    fn upload(&self, rgba: &RgbaImage, label: &str) -> GpuTexture {
        let chain = mip_chain(rgba);
        let size = wgpu::Extent3d {
            width: rgba.width(),
            height: rgba.height(),
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: chain.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in chain.iter().enumerate() {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                mip.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width()),
                    rows_per_image: Some(mip.height()),
                },
                wgpu::Extent3d {
                    width: mip.width(),
                    height: mip.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!(
            "Uploaded texture '{}' {}x{} ({} mips)",
            label,
            size.width,
            size.height,
            chain.len()
        );

        GpuTexture(Rc::new(GpuTextureInner {
            texture,
            view,
            size: (size.width, size.height),
        }))
    }

    /// Trilinear sampler with anisotropic filtering where supported
    pub fn sampler(&self, anisotropic: bool) -> wgpu::Sampler {
        self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panel_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            anisotropy_clamp: if anisotropic { MAX_ANISOTROPY } else { 1 },
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(1024, 768), 11);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn test_mip_chain_halves_to_one_pixel() {
        let image = RgbaImage::from_pixel(16, 4, image::Rgba([200, 10, 10, 255]));
        let chain = mip_chain(&image);
        let sizes: Vec<(u32, u32)> = chain.iter().map(|m| (m.width(), m.height())).collect();
        assert_eq!(sizes, vec![(16, 4), (8, 2), (4, 1), (2, 1), (1, 1)]);
        // A flat color stays flat through the chain
        assert_eq!(chain[4].get_pixel(0, 0).0, [200, 10, 10, 255]);
    }

    #[test]
    fn test_fit_within_device_limit() {
        assert_eq!(fit_within(3000, 2000, 2048), (2048, 1365));
        assert_eq!(fit_within(2000, 3000, 2048), (1365, 2048));
        assert_eq!(fit_within(1024, 768, 2048), (1024, 768));
        assert_eq!(fit_within(2048, 2048, 2048), (2048, 2048));
        // Extreme aspect keeps at least one pixel
        assert_eq!(fit_within(1, 10_000, 2048), (1, 2048));
    }

    #[test]
    fn test_placeholder_is_checkered() {
        let image = placeholder_image();
        assert_eq!(image.dimensions(), (8, 8));
        assert_ne!(image.get_pixel(0, 0), image.get_pixel(1, 0));
        assert_eq!(image.get_pixel(0, 0), image.get_pixel(1, 1));
    }
}
