//! Error types for the gallery
//!
//! Geometry, layout and configuration errors are fatal at startup.
//! Texture errors are recovered per block by the assembler.

use thiserror::Error;

use crate::assembly::ImageId;

/// Unified error type for the gallery.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Mesh parameters would produce a degenerate surface.
    #[error("Invalid panel geometry: {0}")]
    InvalidGeometry(String),

    /// Layout parameters cannot be distributed around the cylinder.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A configuration option is out of range.
    #[error("Invalid configuration option `{option}`: {reason}")]
    InvalidConfig { option: &'static str, reason: String },

    /// Configuration JSON could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The texture for an image could not be fetched.
    #[error("Failed to load image {id}: {reason}")]
    TextureLoad { id: ImageId, reason: String },

    /// The fetched bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    TextureDecode(#[from] image::ImageError),

    /// Recoverable frame submission failure (the loop keeps running).
    #[error("Render error: {0}")]
    Render(String),

    /// Unrecoverable frame submission failure (the loop stops).
    #[error("Fatal render error: {0}")]
    RenderFatal(String),

    /// Browser or host environment failure.
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Convenience alias for `Result<T, GalleryError>`.
pub type GalleryResult<T> = Result<T, GalleryError>;
