//! WebGPU rendering module
//!
//! Draws every block of the scene as a textured curved panel, unlit apart
//! from the scene's ambient term, onto a transparent canvas.

pub mod pipeline;
pub mod texture;
pub mod vertex;

pub use pipeline::GalleryRenderer;
pub use texture::{GpuTexture, TextureFactory};
