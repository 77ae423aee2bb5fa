//! planview - room viewport and region selector for generated interior images
//!
//! Two interactive views over one image: a 3D room whose floor is textured
//! with the image, orbited with the mouse, and a segmentation-based selector
//! that maps clicks on the image to labeled regions and highlights them.

pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod hit_test;
pub mod image_source;
pub mod region_selector;
pub mod segmentation;
pub mod selection;
pub mod viewport;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

pub use camera::{CameraRig, PerspectiveCamera, ViewportState};
pub use config::ViewerConfig;
pub use event::{MouseButton, Point, PointerEvent};
pub use image_source::ImageSource;
pub use region_selector::{RegionSelector, SelectorEvent};
pub use segmentation::{SegmentationResult, Segmenter};
pub use selection::{Highlight, Selection};
pub use viewport::{FrameScheduler, RenderBackend, ViewportHandle};

#[cfg(test)]
mod tests;
