//! Cylinder Gallery - a scroll-driven cylindrical image gallery
//!
//! Core modules:
//! - `gallery`: Deterministic core (panel mesh, layout, scroll, rotation, frame tick)
//! - `assembly`: Image picking and asynchronous block assembly
//! - `scene`: Scene graph shared by the assembler and the renderer
//! - `render_loop`: Per-frame driver
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `config`: Data-driven gallery tuning

pub mod assembly;
pub mod config;
pub mod error;
pub mod gallery;
pub mod platform;
pub mod render_loop;
pub mod renderer;
pub mod scene;

pub use assembly::{AssemblyPolicy, AssemblyReport, GalleryAssembler, ImagePicker, ImagePool, TextureLoader};
pub use config::GalleryConfig;
pub use error::{GalleryError, GalleryResult};
pub use render_loop::{FrameRenderer, RenderLoop};
pub use scene::{Scene, SharedScene};
