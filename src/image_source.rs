//! Source images for the selector canvas and the viewport floor texture.
//!
//! Accepts PNG, JPEG and WebP, detected from magic bytes rather than the
//! file extension.

use std::path::PathBuf;

use image::{ImageFormat, RgbaImage};

use crate::error::InputError;

/// Supported image file extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Check if a filename has a supported image extension.
pub fn is_image_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Detect the image format from its leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageFormat::Png);
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(ImageFormat::WebP);
    }

    None
}

/// An image handed in by the host.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A file on disk.
    Path(PathBuf),
    /// Encoded bytes, e.g. a generation API response.
    Bytes { name: String, data: Vec<u8> },
    /// Already decoded pixels.
    Decoded { name: String, image: RgbaImage },
}

impl ImageSource {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        ImageSource::Bytes {
            name: name.into(),
            data,
        }
    }

    /// Display name used in logs and notifications.
    pub fn name(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes { name, .. } | ImageSource::Decoded { name, .. } => name.clone(),
        }
    }

    /// Decode to RGBA8.
    pub fn decode(&self) -> Result<RgbaImage, InputError> {
        match self {
            ImageSource::Path(path) => {
                let data = std::fs::read(path).map_err(|e| InputError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                decode_bytes(&self.name(), &data)
            }
            ImageSource::Bytes { name, data } => decode_bytes(name, data),
            ImageSource::Decoded { image, .. } => Ok(image.clone()),
        }
    }
}

fn decode_bytes(name: &str, data: &[u8]) -> Result<RgbaImage, InputError> {
    let format = sniff_format(data).ok_or_else(|| InputError::UnsupportedFormat {
        name: name.to_string(),
    })?;

    let image = image::load_from_memory_with_format(data, format)
        .map_err(|e| InputError::Decode {
            name: name.to_string(),
            message: e.to_string(),
        })?
        .to_rgba8();

    log::trace!(
        "Decoded '{}' as {:?} ({}x{})",
        name,
        format,
        image.width(),
        image.height()
    );
    Ok(image)
}
