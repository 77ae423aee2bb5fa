//! Background thread running segmentation inference.
//!
//! Inference can take seconds (model load, network). Running it here keeps
//! the UI thread free for input and rendering; results are polled back.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbaImage;

use super::{SegmentationResult, Segmenter, Ticket, build};
use crate::error::InferenceError;

/// Request to segment an image, sent to the background thread.
struct InferenceRequest {
    ticket: Ticket,
    image: Arc<RgbaImage>,
}

/// Message sent to the inference thread.
enum ThreadMessage {
    Infer(InferenceRequest),
    Shutdown,
}

/// Outcome of one request, tagged with its ticket.
#[derive(Debug)]
pub struct WorkerResult {
    pub ticket: Ticket,
    pub result: Result<SegmentationResult, InferenceError>,
}

/// Owns the inference thread and its channels.
pub struct SegmentationWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<WorkerResult>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SegmentationWorker {
    /// Spawn the inference thread for `segmenter`.
    pub fn spawn(segmenter: Arc<dyn Segmenter>) -> Result<Self, InferenceError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<WorkerResult>();

        let id = segmenter.id();
        let thread_handle = thread::Builder::new()
            .name("segmentation".to_string())
            .spawn(move || {
                log::info!("Segmentation thread started ({})", segmenter.id());
                Self::thread_loop(segmenter.as_ref(), request_rx, result_tx);
                log::info!("Segmentation thread exiting");
            })
            .map_err(|e| {
                InferenceError::ModelUnavailable(format!("failed to spawn {id} worker: {e}"))
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
        })
    }

    fn thread_loop(
        segmenter: &dyn Segmenter,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<WorkerResult>,
    ) {
        while let Ok(message) = request_rx.recv() {
            match message {
                ThreadMessage::Infer(request) => {
                    log::debug!(
                        "Running inference for generation {}",
                        request.ticket.generation()
                    );
                    let result = build(segmenter, &request.image);
                    let reply = WorkerResult {
                        ticket: request.ticket,
                        result,
                    };
                    if result_tx.send(reply).is_err() {
                        log::warn!("Result channel closed, segmentation thread exiting");
                        break;
                    }
                }
                ThreadMessage::Shutdown => {
                    log::debug!("Received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Queue an image for inference.
    pub fn submit(&self, ticket: Ticket, image: Arc<RgbaImage>) -> Result<(), InferenceError> {
        self.request_tx
            .send(ThreadMessage::Infer(InferenceRequest { ticket, image }))
            .map_err(|_| InferenceError::WorkerDisconnected)
    }

    /// Take a finished result without blocking.
    pub fn try_recv(&self) -> Result<Option<WorkerResult>, InferenceError> {
        match self.result_rx.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(InferenceError::WorkerDisconnected),
        }
    }

    /// Wait up to `timeout` for a finished result.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerResult>, InferenceError> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => Ok(Some(result)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(InferenceError::WorkerDisconnected),
        }
    }
}

impl Drop for SegmentationWorker {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("Segmentation thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::{RawSegment, SegmentationIndex};

    struct HalfSegmenter;

    impl Segmenter for HalfSegmenter {
        fn id(&self) -> &'static str {
            "half"
        }

        fn infer(&self, image: &RgbaImage) -> Result<Vec<RawSegment>, InferenceError> {
            let (w, h) = image.dimensions();
            let membership = (0..w * h).map(|i| u8::from(i % w < w / 2)).collect();
            Ok(vec![RawSegment {
                label: "left".into(),
                width: w,
                height: h,
                membership,
            }])
        }
    }

    #[test]
    fn test_worker_round_trip() {
        let worker = SegmentationWorker::spawn(Arc::new(HalfSegmenter)).unwrap();
        let mut index = SegmentationIndex::new();
        let ticket = index.begin();

        worker
            .submit(ticket, Arc::new(RgbaImage::new(4, 2)))
            .unwrap();
        let reply = worker
            .recv_timeout(Duration::from_secs(5))
            .unwrap()
            .expect("worker should reply");

        assert_eq!(reply.ticket, ticket);
        let result = reply.result.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.masks()[0].contains(1, 1).unwrap());
        assert!(!result.masks()[0].contains(2, 1).unwrap());
    }

    #[test]
    fn test_try_recv_empty_when_idle() {
        let worker = SegmentationWorker::spawn(Arc::new(HalfSegmenter)).unwrap();
        assert!(matches!(worker.try_recv(), Ok(None)));
    }
}
