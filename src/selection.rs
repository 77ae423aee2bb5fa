//! Selected region and the highlight overlay drawn over it.

use image::RgbaImage;

use crate::constants::{DEFAULT_HIGHLIGHT_ALPHA, DEFAULT_HIGHLIGHT_COLOR};
use crate::segmentation::SegmentationResult;

/// The label currently selected on the canvas, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    label: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none()
    }

    /// Apply a hit-test result. Hitting the selected label clears it, another
    /// label replaces it, and a miss changes nothing.
    ///
    /// Returns true if the selection changed.
    pub fn toggle(&mut self, hit: Option<&str>) -> bool {
        let Some(hit) = hit else {
            return false;
        };
        if self.label.as_deref() == Some(hit) {
            self.label = None;
        } else {
            self.label = Some(hit.to_string());
        }
        true
    }

    /// Select `label` directly. Returns true if the selection changed.
    pub fn set(&mut self, label: &str) -> bool {
        if self.label.as_deref() == Some(label) {
            return false;
        }
        self.label = Some(label.to_string());
        true
    }

    /// Returns true if something was selected.
    pub fn clear(&mut self) -> bool {
        self.label.take().is_some()
    }

    /// Selection as reported to the host: the label, or an empty string.
    pub fn as_host_string(&self) -> String {
        self.label.clone().unwrap_or_default()
    }
}

/// Color and strength of the selection overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub color: [u8; 3],
    pub alpha: f32,
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            color: DEFAULT_HIGHLIGHT_COLOR,
            alpha: DEFAULT_HIGHLIGHT_ALPHA,
        }
    }
}

impl Highlight {
    /// Blend the highlight over one RGBA pixel, keeping its alpha.
    pub fn blend(&self, pixel: [u8; 4]) -> [u8; 4] {
        let a = self.alpha.clamp(0.0, 1.0);
        let mix = |base: u8, over: u8| -> u8 {
            (base as f32 * (1.0 - a) + over as f32 * a)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        [
            mix(pixel[0], self.color[0]),
            mix(pixel[1], self.color[1]),
            mix(pixel[2], self.color[2]),
            pixel[3],
        ]
    }
}

/// Composite the canvas: a copy of `base` with every mask labeled `selected`
/// highlighted.
pub fn render_overlay(
    base: &RgbaImage,
    result: &SegmentationResult,
    selected: Option<&str>,
    highlight: &Highlight,
) -> RgbaImage {
    let mut out = base.clone();
    let Some(label) = selected else {
        return out;
    };

    // A pixel covered by two masks of the same label is blended once.
    let mut covered = vec![false; out.width() as usize * out.height() as usize];
    for mask in result.masks_with_label(label) {
        if mask.width() != out.width() || mask.height() != out.height() {
            log::warn!(
                "Skipping mask '{}' ({}x{}) on {}x{} canvas",
                label,
                mask.width(),
                mask.height(),
                out.width(),
                out.height()
            );
            continue;
        }
        for (i, &m) in mask.membership().iter().enumerate() {
            if m > 0 {
                covered[i] = true;
            }
        }
    }

    for (pixel, _) in out
        .pixels_mut()
        .zip(covered.iter())
        .filter(|(_, covered)| **covered)
    {
        pixel.0 = highlight.blend(pixel.0);
    }
    out
}
