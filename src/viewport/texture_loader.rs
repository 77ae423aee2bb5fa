//! Background decoding of floor textures.
//!
//! Decoding a large photo takes long enough to stall frames, so it runs on
//! its own thread. Each request carries a generation; the viewport only
//! accepts the result of the latest one.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbaImage;

use crate::error::TextureLoadError;
use crate::image_source::ImageSource;

enum LoaderMessage {
    Load { generation: u64, source: ImageSource },
    Shutdown,
}

/// A finished decode.
#[derive(Debug)]
pub struct LoadedTexture {
    pub generation: u64,
    pub result: Result<RgbaImage, TextureLoadError>,
}

pub struct TextureLoader {
    request_tx: Sender<LoaderMessage>,
    result_rx: Receiver<LoadedTexture>,
    thread_handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TextureLoader {
    pub fn spawn() -> Result<Self, TextureLoadError> {
        let (request_tx, request_rx) = mpsc::channel::<LoaderMessage>();
        let (result_tx, result_rx) = mpsc::channel::<LoadedTexture>();

        let thread_handle = thread::Builder::new()
            .name("texture-loader".to_string())
            .spawn(move || {
                log::debug!("Texture loader thread started");
                while let Ok(message) = request_rx.recv() {
                    let LoaderMessage::Load { generation, source } = message else {
                        break;
                    };
                    let result = source.decode().map_err(TextureLoadError::from);
                    if result_tx.send(LoadedTexture { generation, result }).is_err() {
                        break;
                    }
                }
                log::debug!("Texture loader thread exiting");
            })
            .map_err(|e| {
                log::error!("Failed to spawn texture loader: {}", e);
                TextureLoadError::LoaderDisconnected
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            generation: 0,
        })
    }

    /// Queue `source` for decoding, superseding earlier requests.
    pub fn load(&mut self, source: ImageSource) -> Result<u64, TextureLoadError> {
        self.generation += 1;
        let generation = self.generation;
        log::debug!("Loading texture '{}' (generation {})", source.name(), generation);
        self.request_tx
            .send(LoaderMessage::Load { generation, source })
            .map_err(|_| TextureLoadError::LoaderDisconnected)?;
        Ok(generation)
    }

    /// Forget the pending request; its result will be reported stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, loaded: &LoadedTexture) -> bool {
        loaded.generation == self.generation
    }

    pub fn try_recv(&self) -> Result<Option<LoadedTexture>, TextureLoadError> {
        match self.result_rx.try_recv() {
            Ok(loaded) => Ok(Some(loaded)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TextureLoadError::LoaderDisconnected),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<LoadedTexture>, TextureLoadError> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(loaded) => Ok(Some(loaded)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TextureLoadError::LoaderDisconnected),
        }
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        let _ = self.request_tx.send(LoaderMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;

    #[test]
    fn test_latest_generation_is_current() {
        let mut loader = TextureLoader::spawn().unwrap();
        let image = RgbaImage::new(2, 2);
        let first = loader
            .load(ImageSource::Decoded { name: "a".into(), image: image.clone() })
            .unwrap();
        let second = loader
            .load(ImageSource::Decoded { name: "b".into(), image })
            .unwrap();
        assert!(second > first);

        let a = loader.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        let b = loader.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!(!loader.is_current(&a));
        assert!(loader.is_current(&b));
        assert!(b.result.is_ok());
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let mut loader = TextureLoader::spawn().unwrap();
        loader
            .load(ImageSource::from_bytes("broken", vec![0; 4]))
            .unwrap();
        let loaded = loader.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!(matches!(
            loaded.result,
            Err(TextureLoadError::Decode(InputError::UnsupportedFormat { .. }))
        ));
    }
}
