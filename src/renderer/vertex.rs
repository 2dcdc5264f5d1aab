//! Vertex and uniform types for the panel pipeline

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::gallery::CurvedMesh;

/// Panel vertex: position, normal, texture coordinate
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleave a mesh's attribute arrays for upload
    pub fn from_mesh(mesh: &CurvedMesh) -> Vec<MeshVertex> {
        mesh.positions
            .iter()
            .zip(&mesh.normals)
            .zip(&mesh.uvs)
            .map(|((p, n), uv)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }
}

/// Per-frame values shared by every block (must match shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    /// Gallery group rotation
    pub group: [[f32; 4]; 4],
    /// Ambient light rgb, w unused
    pub ambient: [f32; 4],
}

impl Globals {
    pub fn new(view_proj: Mat4, group: Mat4, ambient: [f32; 3]) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            group: group.to_cols_array_2d(),
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
        }
    }
}

/// Per-block model transform (must match shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BlockUniform {
    pub model: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::curved_panel;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(std::mem::size_of::<Globals>(), 144);
        assert_eq!(std::mem::size_of::<BlockUniform>(), 64);
    }

    #[test]
    fn test_from_mesh_interleaves() {
        let mesh = curved_panel(2.0, 1.0, 4.0, 1).unwrap();
        let vertices = MeshVertex::from_mesh(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[3].position, mesh.positions[3].to_array());
        assert_eq!(vertices[3].uv, mesh.uvs[3].to_array());
    }
}
