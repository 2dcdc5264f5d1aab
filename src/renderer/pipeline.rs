//! WebGPU render pipeline for curved panels

use std::rc::Rc;
use wgpu::util::DeviceExt;

use super::texture::{GpuTexture, TextureFactory};
use super::vertex::{BlockUniform, Globals, MeshVertex};
use crate::error::{GalleryError, GalleryResult};
use crate::gallery::CurvedMesh;
use crate::render_loop::FrameRenderer;
use crate::scene::{Block, FrameView, GalleryGroup, Scene};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Multisample count when the surface format supports it
const MSAA_SAMPLES: u32 = 4;
/// Highest device pixel ratio rendered at; denser screens are upscaled
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Backing-store size for a canvas of `css_width` × `css_height` CSS pixels
pub fn surface_size(css_width: i32, css_height: i32, device_pixel_ratio: f64) -> (u32, u32) {
    let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    };
    let scale = |css: i32| ((css.max(0) as f64 * ratio) as u32).max(1);
    (scale(css_width), scale(css_height))
}

/// Uploaded panel geometry
struct GpuMesh {
    source: Rc<CurvedMesh>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// GPU resources for one inserted block
struct BlockGpu {
    mesh: usize,
    bind_group: wgpu::BindGroup,
}

/// Main render state
pub struct GalleryRenderer {
    pub surface: wgpu::Surface<'static>,
    device: Rc<wgpu::Device>,
    queue: Rc<wgpu::Queue>,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    block_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    sample_count: u32,
    /// Multisampled color target resolved into the surface (None without MSAA)
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    meshes: Vec<GpuMesh>,
    /// Mirrors `scene.gallery.blocks` (insert-only, same order)
    blocks: Vec<BlockGpu>,
    /// Viewport size in pixels
    pub size: (u32, u32),
}

impl GalleryRenderer {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> GalleryResult<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gallery-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .map_err(|e| GalleryError::Platform(format!("Failed to create device: {e}")))?;
        let device = Rc::new(device);
        let queue = Rc::new(queue);

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| GalleryError::Platform("Surface reports no formats".into()))?;

        // Transparent canvas: the page background shows through
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format {:?}, alpha {:?}", surface_format, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let supports_msaa = |format: wgpu::TextureFormat| {
            adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        };
        let sample_count = if supports_msaa(config.format) && supports_msaa(DEPTH_FORMAT) {
            MSAA_SAMPLES
        } else {
            1
        };
        log::info!("MSAA samples: {}", sample_count);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("panel_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let block_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("block_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("panel_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &block_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("panel_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Panels are visible from both sides
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        });

        let anisotropic = adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::ANISOTROPIC_FILTERING);
        let sampler = TextureFactory::new(Rc::clone(&device), Rc::clone(&queue)).sampler(anisotropic);
        log::info!("Anisotropic filtering: {}", anisotropic);

        let depth_view = create_depth_view(&device, config.width, config.height, sample_count);
        let msaa_view = create_msaa_view(&device, &config, sample_count);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            globals_bind_group,
            block_layout,
            sampler,
            sample_count,
            msaa_view,
            depth_view,
            meshes: Vec::new(),
            blocks: Vec::new(),
            size: (width, height),
        })
    }

    /// Factory for block textures on this renderer's device
    pub fn texture_factory(&self) -> TextureFactory {
        TextureFactory::new(Rc::clone(&self.device), Rc::clone(&self.queue))
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height, self.sample_count);
            self.msaa_view = create_msaa_view(&self.device, &self.config, self.sample_count);
        }
    }

    /// Create GPU resources for blocks inserted since the last frame
    fn sync_blocks(&mut self, blocks: &[Block<GpuTexture>]) {
        if blocks.len() <= self.blocks.len() {
            return;
        }
        for block in &blocks[self.blocks.len()..] {
            let mesh = self.mesh_index(&block.mesh);
            let model_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("block_model"),
                contents: bytemuck::bytes_of(&BlockUniform {
                    model: block.model().to_cols_array_2d(),
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("block_bind_group"),
                layout: &self.block_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: model_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(block.texture.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            self.blocks.push(BlockGpu { mesh, bind_group });
        }
        log::debug!("Renderer tracking {} blocks", self.blocks.len());
    }

    /// Index of the uploaded copy of `mesh`, uploading it on first use
    fn mesh_index(&mut self, mesh: &Rc<CurvedMesh>) -> usize {
        if let Some(i) = self.meshes.iter().position(|m| Rc::ptr_eq(&m.source, mesh)) {
            return i;
        }
        let vertices = MeshVertex::from_mesh(mesh);
        let indices = mesh.flat_indices();
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("panel_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("panel_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.push(GpuMesh {
            source: Rc::clone(mesh),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        });
        self.meshes.len() - 1
    }

    fn draw(&mut self, scene: &Scene<GpuTexture>, view: &FrameView) -> Result<(), wgpu::SurfaceError> {
        self.sync_blocks(&scene.gallery.blocks);

        let globals = Globals::new(
            view.camera.view_projection(),
            GalleryGroup::<GpuTexture>::transform(view.gallery_rotation),
            scene.ambient.radiance(),
        );
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let output = self.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gallery_encoder"),
            });

        {
            let [r, g, b, a] = scene.clear_color.map(f64::from);
            let (view, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&target)),
                None => (&target, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gallery_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for block in &self.blocks {
                let mesh = &self.meshes[block.mesh];
                render_pass.set_bind_group(1, &block.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl FrameRenderer<GpuTexture> for GalleryRenderer {
    fn render(&mut self, scene: &Scene<GpuTexture>, view: &FrameView) -> GalleryResult<()> {
        match self.draw(scene, view) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.resize(self.size.0, self.size.1);
                Err(GalleryError::Render("surface lost, reconfigured".into()))
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(GalleryError::RenderFatal("out of memory".into())),
            Err(e) => Err(GalleryError::Render(format!("{e:?}"))),
        }
    }
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count == 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_color"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_caps_pixel_ratio() {
        assert_eq!(surface_size(800, 600, 1.0), (800, 600));
        assert_eq!(surface_size(800, 600, 1.5), (1200, 900));
        assert_eq!(surface_size(800, 600, 3.0), (1600, 1200));
    }

    #[test]
    fn test_surface_size_never_empty() {
        assert_eq!(surface_size(0, 0, 2.0), (1, 1));
        assert_eq!(surface_size(-5, 10, 1.0), (1, 10));
        assert_eq!(surface_size(100, 100, f64::NAN), (100, 100));
    }
}
