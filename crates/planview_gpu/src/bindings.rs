//! Shader binding constants.
//!
//! These numbers must match the `@group`/`@binding` attributes in
//! `shaders/mesh.wgsl`.

/// Binding constants for the mesh pipeline.
pub mod mesh {
    /// Group 0: per-frame uniforms
    pub const FRAME_GROUP: u32 = 0;
    /// Binding 0 in group 0: camera uniform
    pub const CAMERA_BINDING: u32 = 0;
    /// Binding 1 in group 0: light uniform
    pub const LIGHT_BINDING: u32 = 1;

    /// Group 1: per-mesh material
    pub const MATERIAL_GROUP: u32 = 1;
    /// Binding 0 in group 1: material uniform
    pub const MATERIAL_BINDING: u32 = 0;
    /// Binding 1 in group 1: base color texture
    pub const TEXTURE_BINDING: u32 = 1;
    /// Binding 2 in group 1: sampler
    pub const SAMPLER_BINDING: u32 = 2;
}
