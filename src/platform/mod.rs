//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Scroll input and smoothing
//! - Image fetching (browser only)
//! - Page measurement and resize events (browser only)

pub mod scroll;
#[cfg(target_arch = "wasm32")]
pub mod web;
