//! Curved panel geometry
//!
//! A panel is a rectangle bent onto a cylinder around the Y axis:
//! - arc: angular width in radians (panel width / radius)
//! - height: linear extent along Y, centered on 0
//! - every vertex sits exactly `radius` away from the axis

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::error::{GalleryError, GalleryResult};

/// Horizontal columns per base segment
pub const SEGMENT_MULTIPLIER: u32 = 4;
/// Vertical rows per unit of panel height
pub const ROWS_PER_UNIT: f32 = 12.0;
/// UV inset on each horizontal edge (avoids sampling the image border)
pub const UV_MARGIN: f32 = 0.1;
/// Largest vertex grid a panel may have (fits a WebGL2 vertex buffer)
pub const MAX_PANEL_VERTICES: u32 = 1 << 22;

/// A triangulated panel on a cylindrical arc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Triangles as vertex index triples
    pub triangles: Vec<[u32; 3]>,
    pub segments_x: u32,
    pub segments_y: u32,
    pub radius: f32,
    /// Angular width (radians)
    pub arc: f32,
}

impl CurvedMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Index list flattened for upload as a GPU index buffer
    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }
}

/// Build a curved panel of `width` × `height` on a cylinder of `radius`
///
/// The grid has `segments * 4` columns and `floor(height * 12)` rows so
/// vertical resolution follows panel size. Triangles wind so face normals
/// point toward the cylinder axis.
pub fn curved_panel(width: f32, height: f32, radius: f32, segments: u32) -> GalleryResult<CurvedMesh> {
    check_positive("panel width", width)?;
    check_positive("panel height", height)?;
    check_positive("cylinder radius", radius)?;
    if segments == 0 {
        return Err(GalleryError::InvalidGeometry(
            "segment count must be at least 1".into(),
        ));
    }

    let too_dense = || {
        GalleryError::InvalidGeometry(format!(
            "{segments} segments over a panel height of {height} exceed {MAX_PANEL_VERTICES} vertices"
        ))
    };

    let segments_x = segments.checked_mul(SEGMENT_MULTIPLIER).ok_or_else(too_dense)?;
    let rows_f = (height * ROWS_PER_UNIT).floor();
    if rows_f >= MAX_PANEL_VERTICES as f32 {
        return Err(too_dense());
    }
    let segments_y = rows_f as u32;
    if segments_y == 0 {
        return Err(GalleryError::InvalidGeometry(format!(
            "panel height {height} is below the minimum of {} (no vertical rows)",
            1.0 / ROWS_PER_UNIT
        )));
    }

    let arc = width / radius;
    if arc > TAU {
        return Err(GalleryError::InvalidGeometry(format!(
            "panel width {width} wraps past a full turn of a radius {radius} cylinder"
        )));
    }

    let cols = segments_x.checked_add(1).ok_or_else(too_dense)?;
    let rows = segments_y + 1;
    let vertex_count = cols
        .checked_mul(rows)
        .filter(|&n| n <= MAX_PANEL_VERTICES)
        .ok_or_else(too_dense)? as usize;

    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for y in 0..rows {
        let v = y as f32 / segments_y as f32;
        let y_pos = (v - 0.5) * height;
        for x in 0..cols {
            let u = x as f32 / segments_x as f32;
            let angle = (u - 0.5) * arc;
            positions.push(Vec3::new(radius * angle.sin(), y_pos, radius * angle.cos()));
            uvs.push(Vec2::new(u * (1.0 - 2.0 * UV_MARGIN) + UV_MARGIN, v));
        }
    }

    // Bounded by the vertex count check above
    let mut triangles = Vec::with_capacity(segments_x as usize * segments_y as usize * 2);
    for y in 0..segments_y {
        for x in 0..segments_x {
            let a = x + cols * y;
            let b = x + cols * (y + 1);
            let c = x + 1 + cols * (y + 1);
            let d = x + 1 + cols * y;
            triangles.push([a, b, d]);
            triangles.push([b, c, d]);
        }
    }

    let normals = vertex_normals(&positions, &triangles);

    Ok(CurvedMesh {
        positions,
        normals,
        uvs,
        triangles,
        segments_x,
        segments_y,
        radius,
        arc,
    })
}

/// Per-vertex normals: normalized sum of the adjacent face normals
pub fn vertex_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for &[a, b, c] in triangles {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

fn check_positive(name: &str, value: f32) -> GalleryResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GalleryError::InvalidGeometry(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_panel_counts() {
        let mesh = curved_panel(5.0, 3.0, 6.0, 10).unwrap();
        assert_eq!(mesh.segments_x, 40);
        assert_eq!(mesh.segments_y, 36);
        assert_eq!(mesh.vertex_count(), 1517);
        assert_eq!(mesh.triangle_count(), 2880);
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        assert_eq!(mesh.flat_indices().len(), 2880 * 3);
    }

    #[test]
    fn test_panel_is_centered_and_symmetric() {
        let mesh = curved_panel(5.0, 3.0, 6.0, 10).unwrap();
        let first = mesh.positions[0];
        let last = mesh.positions[mesh.vertex_count() - 1];
        assert!((first.y + 1.5).abs() < 1e-5);
        assert!((last.y - 1.5).abs() < 1e-5);
        // Left and right edges mirror each other across the YZ plane
        assert!((first.x + last.x).abs() < 1e-4);
        let half_arc = mesh.arc / 2.0;
        assert!((last.x - 6.0 * half_arc.sin()).abs() < 1e-4);
    }

    #[test]
    fn test_normals_face_the_axis() {
        let mesh = curved_panel(5.0, 3.0, 6.0, 10).unwrap();
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!((n.length() - 1.0).abs() < 1e-4);
            // Radial component points inward
            let radial = Vec3::new(p.x, 0.0, p.z).normalize();
            assert!(n.dot(radial) < -0.99, "normal {n:?} at {p:?}");
        }
    }

    #[test]
    fn test_uv_corners() {
        let mesh = curved_panel(2.0, 1.0, 4.0, 2).unwrap();
        let first = mesh.uvs[0];
        let last = mesh.uvs[mesh.vertex_count() - 1];
        assert!((first.x - 0.1).abs() < 1e-6 && first.y.abs() < 1e-6);
        assert!((last.x - 0.9).abs() < 1e-6 && (last.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_degenerate_parameters() {
        assert!(matches!(
            curved_panel(0.0, 3.0, 6.0, 10),
            Err(GalleryError::InvalidGeometry(_))
        ));
        assert!(curved_panel(5.0, -1.0, 6.0, 10).is_err());
        assert!(curved_panel(5.0, 3.0, 0.0, 10).is_err());
        assert!(curved_panel(5.0, 3.0, f32::NAN, 10).is_err());
        assert!(curved_panel(5.0, 3.0, 6.0, 0).is_err());
        // Too short for a single row
        assert!(curved_panel(5.0, 0.05, 6.0, 10).is_err());
        // Wider than the whole cylinder
        assert!(curved_panel(40.0, 3.0, 6.0, 10).is_err());
    }

    #[test]
    fn test_rejects_grids_past_vertex_limit() {
        // Column count overflows u32
        let err = curved_panel(5.0, 3.0, 6.0, 1_500_000_000).unwrap_err();
        assert!(matches!(err, GalleryError::InvalidGeometry(_)));
        assert!(err.to_string().contains("vertices"));
        // Row count saturates the float to int cast
        assert!(matches!(
            curved_panel(5.0, 1.0e12, 6.0, 10),
            Err(GalleryError::InvalidGeometry(_))
        ));
        // Fits u32 but not a vertex buffer
        assert!(curved_panel(5.0, 3.0, 6.0, 1_000_000).is_err());
    }

    #[test]
    fn test_error_message_names_parameter() {
        let err = curved_panel(5.0, 3.0, -2.0, 10).unwrap_err();
        assert!(err.to_string().contains("cylinder radius"));
    }

    proptest! {
        #[test]
        fn prop_counts_radius_and_uvs(
            width in 0.5f32..10.0,
            height in 0.1f32..6.0,
            radius in 2.0f32..20.0,
            segments in 1u32..16,
        ) {
            let mesh = curved_panel(width, height, radius, segments).unwrap();
            let sx = segments * 4;
            let sy = (height * 12.0).floor() as u32;
            prop_assert_eq!(mesh.vertex_count(), ((sx + 1) * (sy + 1)) as usize);
            prop_assert_eq!(mesh.triangle_count(), (2 * sx * sy) as usize);

            for p in &mesh.positions {
                let r = (p.x * p.x + p.z * p.z).sqrt();
                prop_assert!(((r - radius) / radius).abs() <= 1e-4);
            }
            for uv in &mesh.uvs {
                prop_assert!(uv.x >= 0.1 - 1e-6 && uv.x <= 0.9 + 1e-6);
                prop_assert!(uv.y >= 0.0 && uv.y <= 1.0);
            }
        }
    }
}
