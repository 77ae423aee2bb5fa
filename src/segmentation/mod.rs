//! Segmentation index: labeled pixel masks for one source image.
//!
//! A [`Segmenter`] turns an image into raw labeled masks. [`build`] validates
//! them into an immutable [`SegmentationResult`], and [`SegmentationIndex`]
//! holds the current result for the selector, discarding results of
//! superseded requests by generation.

mod label_map;
mod worker;

pub use label_map::{LabelMapSegmenter, PaletteEntry};
pub use worker::{SegmentationWorker, WorkerResult};

use std::collections::BTreeSet;

use image::RgbaImage;

use crate::error::{BoundsError, InferenceError};

/// A labeled mask as returned by an inference backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// One byte per pixel, row-major; nonzero means the pixel belongs to the mask.
    pub membership: Vec<u8>,
}

/// Inference collaborator producing labeled masks for an image.
pub trait Segmenter: Send + Sync {
    /// Short identifier for logs.
    fn id(&self) -> &'static str;

    /// Segment `image`. Masks come back in priority order.
    fn infer(&self, image: &RgbaImage) -> Result<Vec<RawSegment>, InferenceError>;
}

/// A validated per-pixel membership mask.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    label: String,
    width: u32,
    height: u32,
    membership: Vec<u8>,
}

impl SegmentationMask {
    /// Create a mask, checking that the buffer holds `width * height` samples.
    pub fn new(
        label: impl Into<String>,
        width: u32,
        height: u32,
        membership: Vec<u8>,
    ) -> Result<Self, InferenceError> {
        let label = label.into();
        if membership.len() != width as usize * height as usize {
            return Err(InferenceError::MaskShape {
                len: membership.len(),
                mask_width: width,
                mask_height: height,
                image_width: width,
                image_height: height,
                label,
            });
        }
        Ok(Self {
            label,
            width,
            height,
            membership,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn membership(&self) -> &[u8] {
        &self.membership
    }

    /// Membership at a row-major index; out-of-range indices are not members.
    pub fn is_member(&self, index: usize) -> bool {
        self.membership.get(index).is_some_and(|&v| v > 0)
    }

    /// Checked membership lookup at pixel `(x, y)`.
    pub fn contains(&self, x: u32, y: u32) -> Result<bool, BoundsError> {
        if x >= self.width || y >= self.height {
            return Err(BoundsError {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.is_member(y as usize * self.width as usize + x as usize))
    }

    /// Number of member pixels.
    pub fn pixel_count(&self) -> usize {
        self.membership.iter().filter(|&&v| v > 0).count()
    }
}

/// Ordered masks for one image. Earlier masks win hit tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentationResult {
    width: u32,
    height: u32,
    masks: Vec<SegmentationMask>,
}

impl SegmentationResult {
    /// Validate raw segments against the source image dimensions.
    pub fn from_segments(
        segments: Vec<RawSegment>,
        width: u32,
        height: u32,
    ) -> Result<Self, InferenceError> {
        let mut masks = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.width != width
                || segment.height != height
                || segment.membership.len() != width as usize * height as usize
            {
                return Err(InferenceError::MaskShape {
                    label: segment.label,
                    mask_width: segment.width,
                    mask_height: segment.height,
                    len: segment.membership.len(),
                    image_width: width,
                    image_height: height,
                });
            }
            masks.push(SegmentationMask::new(
                segment.label,
                segment.width,
                segment.height,
                segment.membership,
            )?);
        }
        Ok(Self {
            width,
            height,
            masks,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn masks(&self) -> &[SegmentationMask] {
        &self.masks
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// All masks carrying `label`.
    pub fn masks_with_label<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a SegmentationMask> + 'a {
        self.masks.iter().filter(move |m| m.label == label)
    }

    /// Deduplicated labels, for legends and label buttons.
    pub fn unique_labels(&self) -> BTreeSet<String> {
        self.masks.iter().map(|m| m.label.clone()).collect()
    }
}

/// Run `segmenter` on `image` and validate its output.
pub fn build(
    segmenter: &dyn Segmenter,
    image: &RgbaImage,
) -> Result<SegmentationResult, InferenceError> {
    let segments = segmenter.infer(image)?;
    log::debug!(
        "Segmenter '{}' returned {} masks for {}x{} image",
        segmenter.id(),
        segments.len(),
        image.width(),
        image.height()
    );
    SegmentationResult::from_segments(segments, image.width(), image.height())
}

/// Identifies one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of [`SegmentationIndex::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexUpdate {
    /// The result became the current index.
    Applied,
    /// The request failed; the index is now empty.
    Failed(InferenceError),
    /// A newer request was issued since; the result was dropped.
    Stale,
}

/// The current segmentation of the image on the canvas.
#[derive(Debug, Default)]
pub struct SegmentationIndex {
    result: SegmentationResult,
    generation: u64,
    pending: bool,
}

impl SegmentationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request. Empties the index and invalidates older tickets.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.result = SegmentationResult::default();
        self.pending = true;
        Ticket {
            generation: self.generation,
        }
    }

    /// Apply the outcome of the request identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<SegmentationResult, InferenceError>,
    ) -> IndexUpdate {
        if ticket.generation != self.generation {
            log::debug!(
                "Dropping stale segmentation (generation {} < {})",
                ticket.generation,
                self.generation
            );
            return IndexUpdate::Stale;
        }

        self.pending = false;
        match outcome {
            Ok(result) => {
                log::info!(
                    "Segmentation ready: {} masks, {} labels",
                    result.len(),
                    result.unique_labels().len()
                );
                self.result = result;
                IndexUpdate::Applied
            }
            Err(e) => {
                log::warn!("Segmentation failed: {}", e);
                self.result = SegmentationResult::default();
                IndexUpdate::Failed(e)
            }
        }
    }

    /// Empty the index and invalidate any request in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.result = SegmentationResult::default();
        self.pending = false;
    }

    pub fn result(&self) -> &SegmentationResult {
        &self.result
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn unique_labels(&self) -> BTreeSet<String> {
        self.result.unique_labels()
    }
}
