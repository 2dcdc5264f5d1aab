//! Scene graph for the gallery
//!
//! Built once by the assembler and read by the renderer every frame.
//! Blocks are only ever inserted; the gallery is static once loaded.

use glam::{Mat4, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

use crate::assembly::{ImageId, TextureSource};
use crate::gallery::{Camera, CurvedMesh};

/// Non-directional light applied evenly to every panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

impl AmbientLight {
    /// Color scaled by intensity
    pub fn radiance(&self) -> [f32; 3] {
        self.color.map(|c| c * self.intensity)
    }
}

/// A textured panel placed on the cylinder
#[derive(Debug, Clone)]
pub struct Block<T> {
    pub section: u32,
    pub slot: u32,
    pub image: ImageId,
    pub texture: T,
    pub texture_source: TextureSource,
    /// Shared panel geometry
    pub mesh: Rc<CurvedMesh>,
    /// Height of the panel center
    pub offset_y: f32,
    /// Rotation about the cylinder axis (radians)
    pub rotation_y: f32,
}

impl<T> Block<T> {
    /// Local transform inside the gallery group
    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_y) * Mat4::from_translation(Vec3::new(0.0, self.offset_y, 0.0))
    }
}

/// Parent node of every block; spun as a whole each frame
#[derive(Debug, Clone)]
pub struct GalleryGroup<T> {
    pub blocks: Vec<Block<T>>,
}

impl<T> Default for GalleryGroup<T> {
    fn default() -> Self {
        Self { blocks: Vec::new() }
    }
}

impl<T> GalleryGroup<T> {
    pub fn transform(rotation_y: f32) -> Mat4 {
        Mat4::from_rotation_y(rotation_y)
    }
}

#[derive(Debug, Clone)]
pub struct Scene<T> {
    /// RGBA clear color; fully transparent so the page shows through
    pub clear_color: [f32; 4],
    pub ambient: AmbientLight,
    pub gallery: GalleryGroup<T>,
}

impl<T> Default for Scene<T> {
    fn default() -> Self {
        Self {
            clear_color: [0.0; 4],
            ambient: AmbientLight::default(),
            gallery: GalleryGroup::default(),
        }
    }
}

impl<T> Scene<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.gallery.blocks.len()
    }
}

/// What the renderer needs besides the scene for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub camera: Camera,
    pub gallery_rotation: f32,
}

/// Insertion point for assembled blocks
pub trait SceneGraph<T> {
    fn insert_block(&mut self, block: Block<T>);
}

impl<T> SceneGraph<T> for Scene<T> {
    fn insert_block(&mut self, block: Block<T>) {
        self.gallery.blocks.push(block);
    }
}

/// Scene shared between the assembler and the frame loop (single thread)
///
/// The mutable borrow lasts only for the insertion itself, so it never
/// overlaps a frame's read borrow.
#[derive(Debug)]
pub struct SharedScene<T>(pub Rc<RefCell<Scene<T>>>);

impl<T> Clone for SharedScene<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> SharedScene<T> {
    pub fn new(scene: Scene<T>) -> Self {
        Self(Rc::new(RefCell::new(scene)))
    }
}

impl<T> SceneGraph<T> for SharedScene<T> {
    fn insert_block(&mut self, block: Block<T>) {
        self.0.borrow_mut().insert_block(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::curved_panel;
    use std::f32::consts::FRAC_PI_2;

    fn block(rotation_y: f32, offset_y: f32) -> Block<()> {
        Block {
            section: 0,
            slot: 0,
            image: 1,
            texture: (),
            texture_source: TextureSource::Loaded,
            mesh: Rc::new(curved_panel(5.0, 3.0, 6.0, 2).unwrap()),
            offset_y,
            rotation_y,
        }
    }

    #[test]
    fn test_block_model_places_panel_on_cylinder() {
        let b = block(FRAC_PI_2, 2.0);
        // Panel center (0, 0, r) rotated a quarter turn about Y lands on +X
        let p = b.model().transform_point3(Vec3::new(0.0, 0.0, 6.0));
        assert!((p - Vec3::new(6.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_scene_defaults() {
        let scene: Scene<()> = Scene::new();
        assert_eq!(scene.clear_color, [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(scene.ambient.radiance(), [1.0, 1.0, 1.0]);
        assert_eq!(scene.block_count(), 0);
    }

    #[test]
    fn test_shared_scene_insert() {
        let shared = SharedScene::new(Scene::new());
        let mut writer = shared.clone();
        writer.insert_block(block(0.0, 0.0));
        writer.insert_block(block(1.0, 0.0));
        assert_eq!(shared.0.borrow().block_count(), 2);
    }
}
