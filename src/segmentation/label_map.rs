//! Segmenter backed by a color-coded label map.
//!
//! Semantic segmentation models commonly emit a label map: an image the size
//! of the input where each pixel's color names its class. Given the palette,
//! this segmenter splits such a map into one mask per class.

use std::collections::HashMap;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::{RawSegment, Segmenter};
use crate::error::InferenceError;

/// One class of the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub label: String,
    pub color: [u8; 3],
}

impl PaletteEntry {
    pub fn new(label: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

pub struct LabelMapSegmenter {
    label_map: RgbaImage,
    palette: Vec<PaletteEntry>,
}

impl LabelMapSegmenter {
    pub fn new(label_map: RgbaImage, palette: Vec<PaletteEntry>) -> Self {
        Self { label_map, palette }
    }

    /// Parse a palette from a JSON array of `{ "label", "color" }` objects.
    pub fn palette_from_json(json: &str) -> Result<Vec<PaletteEntry>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Segmenter for LabelMapSegmenter {
    fn id(&self) -> &'static str {
        "label-map"
    }

    fn infer(&self, image: &RgbaImage) -> Result<Vec<RawSegment>, InferenceError> {
        if image.dimensions() != self.label_map.dimensions() {
            return Err(InferenceError::UnsupportedInput(format!(
                "label map is {}x{} but image is {}x{}",
                self.label_map.width(),
                self.label_map.height(),
                image.width(),
                image.height()
            )));
        }

        let (width, height) = self.label_map.dimensions();
        let pixel_count = width as usize * height as usize;

        // First entry wins if the palette repeats a color.
        let mut by_color: HashMap<[u8; 3], usize> = HashMap::new();
        for (i, entry) in self.palette.iter().enumerate() {
            by_color.entry(entry.color).or_insert(i);
        }

        let mut buffers: Vec<Option<Vec<u8>>> = vec![None; self.palette.len()];
        let mut unmatched = 0usize;
        for (i, pixel) in self.label_map.pixels().enumerate() {
            let color = [pixel[0], pixel[1], pixel[2]];
            match by_color.get(&color) {
                Some(&class) => {
                    buffers[class].get_or_insert_with(|| vec![0; pixel_count])[i] = 1;
                }
                None => unmatched += 1,
            }
        }

        if unmatched > 0 {
            log::debug!("{} label map pixels have no palette entry", unmatched);
        }

        Ok(self
            .palette
            .iter()
            .zip(buffers)
            .filter_map(|(entry, buffer)| {
                buffer.map(|membership| RawSegment {
                    label: entry.label.clone(),
                    width,
                    height,
                    membership,
                })
            })
            .collect())
    }
}
