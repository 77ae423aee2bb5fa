//! Error types for the viewport and the region selector.
//!
//! None of these are fatal: input and inference failures are reported to the
//! host as notifications, texture failures degrade the scene, and bounds
//! errors are returned from checked lookups instead of reading out of range.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the image handed to the selector or the viewport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// No image was supplied
    #[error("No image supplied")]
    NoImage,

    /// The bytes are not a PNG, JPEG or WebP image
    #[error("Unsupported image format: {name}")]
    UnsupportedFormat {
        /// Name of the offending source
        name: String,
    },

    /// The image could not be decoded
    #[error("Failed to decode image '{name}': {message}")]
    Decode {
        /// Name of the offending source
        name: String,
        /// Decoder message
        message: String,
    },

    /// The image file could not be read
    #[error("Failed to read {path:?}: {message}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// I/O error message
        message: String,
    },
}

/// Failures of the segmentation backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The model could not be loaded
    #[error("Segmentation model unavailable: {0}")]
    ModelUnavailable(String),

    /// The backend failed while processing (network, runtime)
    #[error("Segmentation backend failed: {0}")]
    Backend(String),

    /// The backend cannot process this input
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// A returned mask does not match the source image
    #[error(
        "Mask '{label}' is {mask_width}x{mask_height} with {len} samples, expected {image_width}x{image_height}"
    )]
    MaskShape {
        /// Label of the malformed mask
        label: String,
        /// Mask width reported by the backend
        mask_width: u32,
        /// Mask height reported by the backend
        mask_height: u32,
        /// Actual membership buffer length
        len: usize,
        /// Source image width
        image_width: u32,
        /// Source image height
        image_height: u32,
    },

    /// The background inference thread is gone
    #[error("Segmentation worker disconnected")]
    WorkerDisconnected,
}

impl From<InputError> for InferenceError {
    fn from(e: InputError) -> Self {
        InferenceError::UnsupportedInput(e.to_string())
    }
}

/// Failures turning the source image into a floor texture.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextureLoadError {
    /// The image could not be decoded
    #[error("Texture decode failed: {0}")]
    Decode(#[from] InputError),

    /// The decoded image could not be uploaded to the render backend
    #[error("Texture upload failed: {0}")]
    Upload(String),

    /// The loader thread is gone
    #[error("Texture loader disconnected")]
    LoaderDisconnected,
}

/// A pixel lookup outside a mask's buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Pixel ({x}, {y}) outside {width}x{height} mask")]
pub struct BoundsError {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Per-frame rendering failures.
#[derive(Error, Debug)]
pub enum RenderError {
    /// GPU layer error
    #[error("GPU error: {0}")]
    Gpu(#[from] planview_gpu::GpuError),

    /// The surface was lost and has been reconfigured; the frame was skipped
    #[error("Render surface lost")]
    SurfaceLost,

    /// Render called on a backend without an attached surface
    #[error("No render surface attached")]
    Detached,
}
