//! Gallery core
//!
//! Geometry, layout and per-frame motion. This module is pure:
//! - No rendering, DOM or network dependencies
//! - Randomness only through an injected generator
//! - All frame state lives in `GalleryState`

pub mod layout;
pub mod mesh;
pub mod rotation;
pub mod scroll;
pub mod state;
pub mod tick;

pub use layout::{BlockPlacement, GalleryLayout, LayoutParams, MAX_ANGULAR_JITTER_FRACTION, MAX_BLOCKS, plan_layout};
pub use mesh::{CurvedMesh, MAX_PANEL_VERTICES, curved_panel};
pub use rotation::{RotationDamper, RotationState};
pub use scroll::{DEGENERATE_RANGE_OFFSET, ScrollController, ScrollEvent, ScrollState};
pub use state::{Camera, GalleryState, TickInput};
pub use tick::tick;
