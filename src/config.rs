//! Gallery configuration
//!
//! Read once at startup. On the web it comes from an inline JSON block:
//! `<script id="gallery-config" type="application/json">{ ... }</script>`
//! Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::assembly::{AssemblyPolicy, ImagePool};
use crate::error::{GalleryError, GalleryResult};
use crate::gallery::mesh::{ROWS_PER_UNIT, SEGMENT_MULTIPLIER};
use crate::gallery::{LayoutParams, MAX_BLOCKS, MAX_PANEL_VERTICES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    // === Cylinder ===
    /// Gallery curvature radius
    pub cylinder_radius: f32,
    /// Vertical extent the rings are distributed across
    pub total_gallery_height: f32,

    // === Layout ===
    pub section_count: u32,
    pub slots_per_section: u32,
    /// Distance between rings
    pub vertical_spacing: f32,
    /// Half-range of the random vertical offset per block
    pub vertical_jitter: f32,

    // === Panels ===
    pub panel_width: f32,
    pub panel_height: f32,
    /// Base segment count (columns = 4 × this)
    pub panel_segments: u32,

    // === Motion ===
    /// Idle spin (radians/frame), never damped
    pub base_rotation_speed: f32,
    /// Per-frame decay of the scroll impulse, in (0, 1)
    pub damping_factor: f32,
    /// Scroll velocity (px/frame) → spin impulse (radians/frame)
    pub impulse_scale: f32,
    /// Scroll smoother lerp per 60 Hz frame, in (0, 1]
    pub scroll_lerp: f32,

    // === Camera ===
    pub camera_distance: f32,
    pub field_of_view_deg: f32,

    // === Images ===
    pub image_pool: ImagePool,
    /// URL template, `{}` is replaced by the image id
    pub image_url_pattern: String,
    pub texture_timeout_ms: u32,
    pub assembly_policy: AssemblyPolicy,

    /// Layout/picker seed; derived from the clock when absent
    pub seed: Option<u64>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            cylinder_radius: 6.0,
            total_gallery_height: 30.0,

            section_count: 12,
            slots_per_section: 4,
            vertical_spacing: 3.25,
            vertical_jitter: 0.1,

            panel_width: 5.0,
            panel_height: 3.0,
            panel_segments: 10,

            base_rotation_speed: 0.0025,
            damping_factor: 0.92,
            impulse_scale: 0.005,
            scroll_lerp: 0.1,

            camera_distance: 12.0,
            field_of_view_deg: 75.0,

            image_pool: ImagePool { first: 1, last: 20 },
            image_url_pattern: "assets/img{}.jpg".to_string(),
            texture_timeout_ms: 15_000,
            assembly_policy: AssemblyPolicy::Concurrent,

            seed: None,
        }
    }
}

impl GalleryConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> GalleryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every option; the error names the first offending one
    pub fn validate(&self) -> GalleryResult<()> {
        positive("cylinder_radius", self.cylinder_radius)?;
        positive("total_gallery_height", self.total_gallery_height)?;
        positive("vertical_spacing", self.vertical_spacing)?;
        positive("panel_width", self.panel_width)?;
        positive("panel_height", self.panel_height)?;
        positive("camera_distance", self.camera_distance)?;

        if self.slots_per_section == 0 {
            return Err(invalid("slots_per_section", "must be at least 1"));
        }
        if self.panel_segments == 0 {
            return Err(invalid("panel_segments", "must be at least 1"));
        }
        let columns = u64::from(self.panel_segments) * u64::from(SEGMENT_MULTIPLIER) + 1;
        let rows = ((self.panel_height * ROWS_PER_UNIT).floor() as u64).saturating_add(1);
        if columns.saturating_mul(rows) > u64::from(MAX_PANEL_VERTICES) {
            return Err(invalid(
                "panel_segments",
                format!("panel grid of {columns} x {rows} exceeds {MAX_PANEL_VERTICES} vertices"),
            ));
        }
        if u64::from(self.section_count) * u64::from(self.slots_per_section) > u64::from(MAX_BLOCKS) {
            return Err(invalid(
                "section_count",
                format!(
                    "{} sections x {} slots exceed {MAX_BLOCKS} blocks",
                    self.section_count, self.slots_per_section
                ),
            ));
        }
        if !(self.vertical_jitter.is_finite() && self.vertical_jitter >= 0.0) {
            return Err(invalid("vertical_jitter", "must be zero or positive"));
        }
        if !self.base_rotation_speed.is_finite() {
            return Err(invalid("base_rotation_speed", "must be a finite number"));
        }
        if !(self.damping_factor > 0.0 && self.damping_factor < 1.0) {
            return Err(invalid(
                "damping_factor",
                format!("must be strictly between 0 and 1, got {}", self.damping_factor),
            ));
        }
        if !self.impulse_scale.is_finite() {
            return Err(invalid("impulse_scale", "must be a finite number"));
        }
        if !(self.scroll_lerp > 0.0 && self.scroll_lerp <= 1.0) {
            return Err(invalid("scroll_lerp", "must be in (0, 1]"));
        }
        if !(self.field_of_view_deg > 0.0 && self.field_of_view_deg < 180.0) {
            return Err(invalid("field_of_view_deg", "must be between 0 and 180 degrees"));
        }
        if self.image_pool.first > self.image_pool.last {
            return Err(invalid(
                "image_pool",
                format!(
                    "first ({}) is greater than last ({})",
                    self.image_pool.first, self.image_pool.last
                ),
            ));
        }
        if !self.image_url_pattern.contains("{}") {
            return Err(invalid("image_url_pattern", "must contain a `{}` placeholder"));
        }
        if self.texture_timeout_ms == 0 {
            return Err(invalid("texture_timeout_ms", "must be at least 1"));
        }
        Ok(())
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            sections: self.section_count,
            slots_per_section: self.slots_per_section,
            vertical_spacing: self.vertical_spacing,
            gallery_height: self.total_gallery_height,
            vertical_jitter: self.vertical_jitter,
        }
    }

    /// Id of the DOM element holding the JSON config
    const CONFIG_ELEMENT_ID: &'static str = "gallery-config";

    /// Load config from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> GalleryResult<Self> {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        match json {
            Some(json) if !json.trim().is_empty() => {
                let config = Self::from_json(&json)?;
                log::info!("Loaded gallery config from #{}", Self::CONFIG_ELEMENT_ID);
                Ok(config)
            }
            _ => {
                log::info!("Using default gallery config");
                Ok(Self::default())
            }
        }
    }

    /// Native: defaults, or `GALLERY_CONFIG` JSON from the environment
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> GalleryResult<Self> {
        match std::env::var("GALLERY_CONFIG") {
            Ok(json) => Self::from_json(&json),
            Err(_) => {
                log::info!(
                    "Using default gallery config (set GALLERY_CONFIG to override #{})",
                    Self::CONFIG_ELEMENT_ID
                );
                Ok(Self::default())
            }
        }
    }
}

fn invalid(option: &'static str, reason: impl Into<String>) -> GalleryError {
    GalleryError::InvalidConfig {
        option,
        reason: reason.into(),
    }
}

fn positive(option: &'static str, value: f32) -> GalleryResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(option, format!("must be a positive number, got {value}")))
    }
}
