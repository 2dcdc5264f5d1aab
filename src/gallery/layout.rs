//! Block layout around the cylinder
//!
//! Blocks are arranged in horizontal rings ("sections") stacked along Y,
//! each ring holding a fixed number of evenly spaced slots. Every block gets
//! a small random angular and vertical jitter so the grid never looks rigid.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::error::{GalleryError, GalleryResult};

/// Maximum angular jitter as a fraction of the slot angle (keeps slots apart)
pub const MAX_ANGULAR_JITTER_FRACTION: f32 = 0.3;
/// Most blocks a gallery may hold (each one is a texture fetch)
pub const MAX_BLOCKS: u32 = 1 << 16;

/// Where a single block sits on the cylinder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockPlacement {
    pub section: u32,
    pub slot: u32,
    /// Ring height before jitter
    pub base_offset: f32,
    pub vertical_jitter: f32,
    /// Slot angle before jitter (radians)
    pub base_angle: f32,
    pub angle_jitter: f32,
}

impl BlockPlacement {
    /// Final height of the block center
    #[inline]
    pub fn vertical_offset(&self) -> f32 {
        self.base_offset + self.vertical_jitter
    }

    /// Final rotation about the cylinder axis (radians)
    #[inline]
    pub fn angular_offset(&self) -> f32 {
        self.base_angle + self.angle_jitter
    }
}

/// Parameters for [`plan_layout`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub sections: u32,
    pub slots_per_section: u32,
    pub vertical_spacing: f32,
    pub gallery_height: f32,
    /// Half-range of the uniform vertical jitter
    pub vertical_jitter: f32,
}

/// Ordered placements, section-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryLayout {
    pub placements: Vec<BlockPlacement>,
    pub sections: u32,
    pub slots_per_section: u32,
    pub vertical_spacing: f32,
    pub gallery_height: f32,
}

impl GalleryLayout {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Gap left between the gallery ends and the occupied band
    pub fn buffer(&self) -> f32 {
        (self.gallery_height - self.sections as f32 * self.vertical_spacing) / 2.0
    }

    /// Vertical band `(bottom, top)` occupied by the rings
    ///
    /// Each ring owns the spacing interval that ends at its base offset.
    pub fn vertical_extent(&self) -> (f32, f32) {
        let bottom = -self.gallery_height / 2.0 + self.buffer();
        (bottom, bottom + self.sections as f32 * self.vertical_spacing)
    }

    /// Angle between neighbouring slots (radians)
    pub fn slot_angle(&self) -> f32 {
        TAU / self.slots_per_section as f32
    }
}

/// Plan `sections × slots_per_section` block placements
///
/// Rings are centered in the gallery height with an equal buffer at both
/// ends. Pass a seeded generator for a reproducible layout.
pub fn plan_layout<R: Rng + ?Sized>(params: &LayoutParams, rng: &mut R) -> GalleryResult<GalleryLayout> {
    let LayoutParams {
        sections,
        slots_per_section,
        vertical_spacing,
        gallery_height,
        vertical_jitter,
    } = *params;

    if slots_per_section == 0 {
        return Err(GalleryError::InvalidLayout(
            "slots per section must be at least 1".into(),
        ));
    }
    if !(vertical_spacing.is_finite() && vertical_spacing > 0.0) {
        return Err(GalleryError::InvalidLayout(format!(
            "vertical spacing must be positive, got {vertical_spacing}"
        )));
    }
    if !(gallery_height.is_finite() && gallery_height > 0.0) {
        return Err(GalleryError::InvalidLayout(format!(
            "gallery height must be positive, got {gallery_height}"
        )));
    }
    if !(vertical_jitter.is_finite() && vertical_jitter >= 0.0) {
        return Err(GalleryError::InvalidLayout(format!(
            "vertical jitter must be zero or positive, got {vertical_jitter}"
        )));
    }

    let block_count = sections
        .checked_mul(slots_per_section)
        .filter(|&n| n <= MAX_BLOCKS)
        .ok_or_else(|| {
            GalleryError::InvalidLayout(format!(
                "{sections} sections x {slots_per_section} slots exceed {MAX_BLOCKS} blocks"
            ))
        })?;

    let total_block_height = sections as f32 * vertical_spacing;
    if total_block_height > gallery_height {
        log::warn!(
            "Rings need {} units but gallery height is {}; blocks overflow both ends",
            total_block_height,
            gallery_height
        );
    }

    let buffer = (gallery_height - total_block_height) / 2.0;
    let start = -gallery_height / 2.0 + buffer + vertical_spacing;
    let slot_angle = TAU / slots_per_section as f32;
    let max_jitter = slot_angle * MAX_ANGULAR_JITTER_FRACTION;

    let mut placements = Vec::with_capacity(block_count as usize);
    for section in 0..sections {
        let base_offset = start + section as f32 * vertical_spacing;
        for slot in 0..slots_per_section {
            placements.push(BlockPlacement {
                section,
                slot,
                base_offset,
                vertical_jitter: rng.random_range(-vertical_jitter..=vertical_jitter),
                base_angle: slot as f32 * slot_angle,
                angle_jitter: rng.random_range(-max_jitter..=max_jitter),
            });
        }
    }

    log::debug!(
        "Planned {} blocks: {} rings x {} slots, buffer {:.3}",
        placements.len(),
        sections,
        slots_per_section,
        buffer
    );

    Ok(GalleryLayout {
        placements,
        sections,
        slots_per_section,
        vertical_spacing,
        gallery_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn params(sections: u32, slots: u32, spacing: f32, height: f32) -> LayoutParams {
        LayoutParams {
            sections,
            slots_per_section: slots,
            vertical_spacing: spacing,
            gallery_height: height,
            vertical_jitter: 0.1,
        }
    }

    #[test]
    fn test_default_gallery_layout() {
        let mut rng = Pcg32::seed_from_u64(7);
        let layout = plan_layout(&params(12, 4, 3.25, 30.0), &mut rng).unwrap();
        assert_eq!(layout.len(), 48);

        // buffer = (30 - 39) / 2 = -4.5, first ring at -15 - 4.5 + 3.25
        let first = layout.placements[0];
        assert!((first.base_offset - (-16.25)).abs() < 1e-5);
        let last = layout.placements[47];
        assert!((last.base_offset - 19.5).abs() < 1e-5);
        assert_eq!((last.section, last.slot), (11, 3));
    }

    #[test]
    fn test_order_is_section_major() {
        let mut rng = Pcg32::seed_from_u64(1);
        let layout = plan_layout(&params(3, 5, 1.0, 10.0), &mut rng).unwrap();
        let order: Vec<(u32, u32)> = layout.placements.iter().map(|p| (p.section, p.slot)).collect();
        let expected: Vec<(u32, u32)> = (0..3).flat_map(|s| (0..5).map(move |i| (s, i))).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_centered_within_height() {
        let mut rng = Pcg32::seed_from_u64(3);
        let layout = plan_layout(&params(4, 3, 2.0, 20.0), &mut rng).unwrap();
        let (bottom, top) = layout.vertical_extent();
        assert!((top - bottom - 8.0).abs() < 1e-5);
        assert!(((bottom + 10.0) - (10.0 - top)).abs() < 1e-5);
        assert!((layout.buffer() - 6.0).abs() < 1e-5);

        let lowest = layout.placements.iter().map(|p| p.base_offset).fold(f32::MAX, f32::min);
        let highest = layout.placements.iter().map(|p| p.base_offset).fold(f32::MIN, f32::max);
        assert!((lowest - 2.0 - bottom).abs() < 1e-5);
        assert!((highest - top).abs() < 1e-5);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let p = params(12, 4, 3.25, 30.0);
        let a = plan_layout(&p, &mut Pcg32::seed_from_u64(42)).unwrap();
        let b = plan_layout(&p, &mut Pcg32::seed_from_u64(42)).unwrap();
        let c = plan_layout(&p, &mut Pcg32::seed_from_u64(43)).unwrap();
        assert_eq!(a.placements, b.placements);
        assert_ne!(a.placements, c.placements);
    }

    #[test]
    fn test_zero_sections_is_empty() {
        let mut rng = Pcg32::seed_from_u64(0);
        let layout = plan_layout(&params(0, 4, 3.25, 30.0), &mut rng).unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(matches!(
            plan_layout(&params(2, 0, 1.0, 10.0), &mut rng),
            Err(GalleryError::InvalidLayout(_))
        ));
        assert!(plan_layout(&params(2, 4, 0.0, 10.0), &mut rng).is_err());
        assert!(plan_layout(&params(2, 4, 1.0, -5.0), &mut rng).is_err());
        let mut negative_jitter = params(2, 4, 1.0, 10.0);
        negative_jitter.vertical_jitter = -0.1;
        assert!(plan_layout(&negative_jitter, &mut rng).is_err());
    }

    #[test]
    fn test_rejects_too_many_blocks() {
        let mut rng = Pcg32::seed_from_u64(0);
        // Product overflows u32
        let err = plan_layout(&params(70_000, 70_000, 1.0, 10.0), &mut rng).unwrap_err();
        assert!(matches!(err, GalleryError::InvalidLayout(_)));
        assert!(err.to_string().contains("70000 sections"));
        // Fits u32 but past the block limit
        assert!(plan_layout(&params(MAX_BLOCKS, 2, 1.0, 10.0), &mut rng).is_err());
        // At the limit
        let layout = plan_layout(&params(MAX_BLOCKS / 4, 4, 0.001, 100.0), &mut rng).unwrap();
        assert_eq!(layout.len(), MAX_BLOCKS as usize);
    }

    proptest! {
        #[test]
        fn prop_jitter_bounds(
            seed in any::<u64>(),
            sections in 1u32..16,
            slots in 1u32..12,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let layout = plan_layout(&params(sections, slots, 3.25, 60.0), &mut rng).unwrap();
            let max_jitter = 0.3 * TAU / slots as f32;
            prop_assert_eq!(layout.len(), (sections * slots) as usize);
            for p in &layout.placements {
                prop_assert!((p.angular_offset() - p.base_angle).abs() <= max_jitter + 1e-6);
                prop_assert!((p.vertical_offset() - p.base_offset).abs() <= 0.1 + 1e-6);
                prop_assert!((p.base_angle - p.slot as f32 * TAU / slots as f32).abs() < 1e-5);
            }
        }
    }
}
