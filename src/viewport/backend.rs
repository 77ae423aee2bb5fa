//! Render backend seam of the viewport.

use glam::{Mat4, Vec3};
use image::RgbaImage;

use super::scene::Scene;
use crate::error::{RenderError, TextureLoadError};

/// Backend-issued handle to an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// One frame's worth of input for a backend.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub view_proj: Mat4,
    pub eye: Vec3,
}

/// Draws a [`Scene`] onto a surface owned by the backend.
pub trait RenderBackend {
    /// Prepare the surface at the given size.
    fn attach(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<TextureId, TextureLoadError>;

    fn release_texture(&mut self, id: TextureId);

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;

    /// Release every GPU resource and the surface.
    fn detach(&mut self);
}
