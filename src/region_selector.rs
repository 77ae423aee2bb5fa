//! Click-to-select regions of a segmented image.
//!
//! Owns the segmentation worker, the current index and selection, and the
//! composited canvas. The host feeds images, clicks and polls; everything it
//! needs to show comes back as [`SelectorEvent`]s plus [`RegionSelector::canvas`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::error::{InferenceError, InputError};
use crate::event::Point;
use crate::hit_test;
use crate::image_source::ImageSource;
use crate::segmentation::{
    IndexUpdate, SegmentationIndex, SegmentationWorker, Segmenter, WorkerResult,
};
use crate::selection::{Highlight, Selection, render_overlay};

/// Notifications for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorEvent {
    /// Inference started; show a busy indicator.
    AnalysisStarted,
    /// Inference finished; these labels can be selected.
    Segmented { labels: BTreeSet<String> },
    /// Inference failed. The index is empty and the selection reset.
    AnalysisFailed(String),
    /// The supplied image could not be decoded.
    InputRejected(String),
    /// The selected label, or an empty string for no selection.
    SelectionChanged(String),
}

pub struct RegionSelector {
    segmenter: Arc<dyn Segmenter>,
    /// `None` after the inference thread died; respawned on the next image.
    worker: Option<SegmentationWorker>,
    index: SegmentationIndex,
    selection: Selection,
    highlight: Highlight,
    base: Option<Arc<RgbaImage>>,
    canvas: Option<RgbaImage>,
}

impl RegionSelector {
    pub fn new(segmenter: Arc<dyn Segmenter>, highlight: Highlight) -> Result<Self, InferenceError> {
        Ok(Self {
            worker: Some(SegmentationWorker::spawn(Arc::clone(&segmenter))?),
            segmenter,
            index: SegmentationIndex::new(),
            selection: Selection::new(),
            highlight,
            base: None,
            canvas: None,
        })
    }

    /// Show a new image and start analysing it. `None` leaves the selector idle.
    pub fn set_image(&mut self, source: Option<ImageSource>) -> Vec<SelectorEvent> {
        let mut events = Vec::new();
        if self.selection.clear() {
            events.push(SelectorEvent::SelectionChanged(String::new()));
        }
        self.index.reset();
        self.base = None;
        self.canvas = None;

        let Some(source) = source else {
            log::info!("{}", InputError::NoImage);
            return events;
        };

        let image = match source.decode() {
            Ok(image) => Arc::new(image),
            Err(e) => {
                log::warn!("Selector input rejected: {}", e);
                events.push(SelectorEvent::InputRejected(e.to_string()));
                return events;
            }
        };

        log::info!(
            "Analysing '{}' ({}x{})",
            source.name(),
            image.width(),
            image.height()
        );
        self.canvas = Some(image.as_ref().clone());
        self.base = Some(Arc::clone(&image));

        let ticket = self.index.begin();
        let submitted = self
            .ensure_worker()
            .and_then(|worker| worker.submit(ticket, image));
        match submitted {
            Ok(()) => events.push(SelectorEvent::AnalysisStarted),
            Err(e) => {
                self.worker = None;
                self.index.complete(ticket, Err(e.clone()));
                events.push(SelectorEvent::AnalysisFailed(e.to_string()));
            }
        }
        events
    }

    fn ensure_worker(&mut self) -> Result<&SegmentationWorker, InferenceError> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => {
                log::info!("Respawning segmentation worker ({})", self.segmenter.id());
                SegmentationWorker::spawn(Arc::clone(&self.segmenter))?
            }
        };
        Ok(self.worker.insert(worker))
    }

    /// Collect finished inference without blocking.
    pub fn poll(&mut self) -> Vec<SelectorEvent> {
        let mut events = Vec::new();
        loop {
            let received = match self.worker.as_ref() {
                Some(worker) => worker.try_recv(),
                None => break,
            };
            match received {
                Ok(Some(reply)) => events.extend(self.apply(reply)),
                Ok(None) => break,
                Err(e) => {
                    events.extend(self.fail_pending(e));
                    break;
                }
            }
        }
        events
    }

    /// Block until the pending analysis finishes or `timeout` elapses.
    pub fn wait_for_analysis(&mut self, timeout: Duration) -> Vec<SelectorEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.index.is_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("Timed out waiting for segmentation");
                break;
            }
            let received = match self.worker.as_ref() {
                Some(worker) => worker.recv_timeout(remaining),
                None => Err(InferenceError::WorkerDisconnected),
            };
            match received {
                Ok(Some(reply)) => events.extend(self.apply(reply)),
                Ok(None) => {}
                Err(e) => {
                    events.extend(self.fail_pending(e));
                    break;
                }
            }
        }
        events
    }

    fn apply(&mut self, reply: WorkerResult) -> Option<SelectorEvent> {
        match self.index.complete(reply.ticket, reply.result) {
            IndexUpdate::Applied => Some(SelectorEvent::Segmented {
                labels: self.index.unique_labels(),
            }),
            IndexUpdate::Failed(e) => Some(self.failed(e)),
            IndexUpdate::Stale => None,
        }
    }

    /// The inference thread is gone. Fail whatever was in flight.
    fn fail_pending(&mut self, e: InferenceError) -> Option<SelectorEvent> {
        log::warn!("Segmentation worker lost: {}", e);
        self.worker = None;
        if !self.index.is_pending() {
            return None;
        }
        // Drop the in-flight request and report the failure in its place.
        let ticket = self.index.begin();
        self.index.complete(ticket, Err(e.clone()));
        Some(self.failed(e))
    }

    fn failed(&mut self, e: InferenceError) -> SelectorEvent {
        self.selection.clear();
        self.recomposite();
        SelectorEvent::AnalysisFailed(e.to_string())
    }

    /// Handle a click at `position` on a canvas drawn at `display_width` x
    /// `display_height`. Inert while analysis is pending.
    pub fn click(
        &mut self,
        position: Point,
        display_width: f32,
        display_height: f32,
    ) -> Option<SelectorEvent> {
        if self.is_busy() {
            log::debug!("Ignoring click while segmentation is pending");
            return None;
        }
        let base = self.base.as_ref()?;
        let hit = hit_test::resolve(
            self.index.result(),
            position.x,
            position.y,
            display_width,
            display_height,
            base.width(),
            base.height(),
        );
        log::debug!("Click at ({}, {}) hit {:?}", position.x, position.y, hit);

        if !self.selection.toggle(hit) {
            return None;
        }
        self.recomposite();
        Some(SelectorEvent::SelectionChanged(
            self.selection.as_host_string(),
        ))
    }

    /// Select a label directly, e.g. from a legend button.
    pub fn select_label(&mut self, label: &str) -> Option<SelectorEvent> {
        if self.index.result().masks_with_label(label).next().is_none() {
            log::debug!("No region labeled '{}'", label);
            return None;
        }
        if !self.selection.set(label) {
            return None;
        }
        self.recomposite();
        Some(SelectorEvent::SelectionChanged(label.to_string()))
    }

    pub fn clear_selection(&mut self) -> Option<SelectorEvent> {
        if !self.selection.clear() {
            return None;
        }
        self.recomposite();
        Some(SelectorEvent::SelectionChanged(String::new()))
    }

    fn recomposite(&mut self) {
        self.canvas = self.base.as_ref().map(|base| {
            render_overlay(
                base,
                self.index.result(),
                self.selection.label(),
                &self.highlight,
            )
        });
    }

    pub fn is_busy(&self) -> bool {
        self.index.is_pending()
    }

    pub fn unique_labels(&self) -> BTreeSet<String> {
        self.index.unique_labels()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The base image with the current selection highlighted.
    pub fn canvas(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref()
    }
}
