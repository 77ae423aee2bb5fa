//! GPU layer for the planview room viewport.
//!
//! Wraps wgpu device/surface setup, texture upload and the lit mesh pipeline
//! used to draw the procedural floor and walls.

pub mod bindings;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod texture;
pub mod uniform;
pub mod vertex;

pub use config::{ClearColor, GpuConfig, TextureConfig};
pub use context::GpuContext;
pub use error::{GpuError, Result};
pub use pipeline::{BlendMode, GpuMesh, MeshPipeline};
pub use texture::{DepthTexture, Texture};
pub use uniform::{CameraUniform, LightUniform, MaterialUniform};
pub use vertex::MeshVertex;
