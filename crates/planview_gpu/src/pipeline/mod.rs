//! Render pipelines.

pub mod builder;
pub mod mesh;

pub use builder::{BindGroupLayoutBuilder, PipelineBuilder};
pub use mesh::{BlendMode, GpuMesh, MeshPipeline};
