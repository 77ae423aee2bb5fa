//! Uniform types shared with `shaders/mesh.wgsl`.
//!
//! Every field is padded to 16 bytes so the layouts match WGSL's uniform
//! address space rules without explicit padding members.

use bytemuck::{Pod, Zeroable};

/// View-projection matrix plus eye position.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: [[f32; 4]; 4], eye: [f32; 3]) -> Self {
        Self {
            view_proj,
            eye: [eye[0], eye[1], eye[2], 1.0],
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            eye: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Ambient term plus a single directional light.
///
/// Colors are pre-multiplied by intensity; `direction` points from the
/// surface towards the light.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    pub directional_color: [f32; 4],
    pub direction: [f32; 4],
}

/// Per-mesh material.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    /// Base color, alpha is the material opacity.
    pub color: [f32; 4],
    /// x: 1.0 when the bound texture should be sampled.
    pub params: [f32; 4],
}

impl MaterialUniform {
    pub fn solid(rgb: [f32; 3], opacity: f32) -> Self {
        Self {
            color: [rgb[0], rgb[1], rgb[2], opacity],
            params: [0.0; 4],
        }
    }

    /// Sample the bound texture, tinted by `rgb`.
    pub fn textured(rgb: [f32; 3], opacity: f32) -> Self {
        Self {
            params: [1.0, 0.0, 0.0, 0.0],
            ..Self::solid(rgb, opacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
    }

    #[test]
    fn test_material_constructors() {
        let wall = MaterialUniform::solid([0.8, 0.8, 0.8], 0.5);
        assert_eq!(wall.color[3], 0.5);
        assert_eq!(wall.params[0], 0.0);
        let floor = MaterialUniform::textured([1.0; 3], 1.0);
        assert_eq!(floor.color, [1.0; 4]);
        assert_eq!(floor.params[0], 1.0);
    }
}
