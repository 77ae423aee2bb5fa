//! wgpu implementation of [`RenderBackend`].

use std::collections::HashMap;

use image::RgbaImage;
use planview_gpu::{
    BlendMode, CameraUniform, ClearColor, DepthTexture, GpuContext, GpuError, GpuMesh,
    LightUniform, MaterialUniform, MeshPipeline, Texture,
};

use super::backend::{Frame, RenderBackend, TextureId};
use super::scene::{Light, Scene};
use crate::error::{RenderError, TextureLoadError};

/// GPU state that only exists while attached.
struct Attached {
    pipeline: MeshPipeline,
    depth: DepthTexture,
    meshes: Vec<GpuMesh>,
    /// Scene revision the uploaded meshes were built from.
    mesh_revision: Option<u64>,
}

pub struct WgpuBackend {
    context: Option<GpuContext>,
    attached: Option<Attached>,
    textures: HashMap<TextureId, Texture>,
    next_texture_id: u64,
}

impl WgpuBackend {
    pub fn new(context: GpuContext) -> Self {
        Self {
            context: Some(context),
            attached: None,
            textures: HashMap::new(),
            next_texture_id: 0,
        }
    }

    pub fn context(&self) -> Option<&GpuContext> {
        self.context.as_ref()
    }

    fn upload_meshes(
        ctx: &GpuContext,
        pipeline: &MeshPipeline,
        textures: &HashMap<TextureId, Texture>,
        scene: &Scene,
    ) -> Vec<GpuMesh> {
        scene
            .meshes()
            .iter()
            .map(|mesh| {
                let texture = mesh.material.texture.and_then(|id| textures.get(&id));
                let (color, opacity) = (mesh.material.color, mesh.material.opacity);
                let material = match texture {
                    Some(_) => MaterialUniform::textured(color, opacity),
                    None => MaterialUniform::solid(color, opacity),
                };
                let blend = if mesh.material.is_translucent() {
                    BlendMode::Translucent
                } else {
                    BlendMode::Opaque
                };
                pipeline.create_mesh(ctx, &mesh.vertices, &mesh.indices, material, texture, blend)
            })
            .collect()
    }
}

/// Fold scene lights into the single ambient + directional uniform.
fn light_uniform(lights: &[Light]) -> LightUniform {
    let mut uniform = LightUniform::default();
    let mut has_directional = false;
    for light in lights {
        match *light {
            Light::Ambient { color, intensity } => {
                for (acc, c) in uniform.ambient.iter_mut().zip(color) {
                    *acc += c * intensity;
                }
            }
            Light::Directional {
                color,
                intensity,
                direction,
            } => {
                if has_directional {
                    log::trace!("Ignoring extra directional light");
                    continue;
                }
                has_directional = true;
                let [r, g, b] = color.map(|c| c * intensity);
                uniform.directional_color = [r, g, b, 1.0];
                uniform.direction = direction.extend(0.0).to_array();
            }
        }
    }
    uniform
}

impl RenderBackend for WgpuBackend {
    fn attach(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let ctx = self.context.as_mut().ok_or(RenderError::Detached)?;
        ctx.resize(width, height);
        let pipeline = MeshPipeline::new(ctx)?;
        let depth = DepthTexture::new(ctx);
        self.attached = Some(Attached {
            pipeline,
            depth,
            meshes: Vec::new(),
            mesh_revision: None,
        });
        log::debug!("Attached wgpu backend at {}x{}", width, height);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        ctx.resize(width, height);
        if let Some(attached) = self.attached.as_mut() {
            attached.depth = DepthTexture::new(ctx);
        }
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<TextureId, TextureLoadError> {
        let ctx = self
            .context
            .as_ref()
            .ok_or_else(|| TextureLoadError::Upload("backend detached".to_string()))?;
        let texture = Texture::from_rgba8(ctx, image.as_raw(), image.width(), image.height())
            .map_err(|e| TextureLoadError::Upload(e.to_string()))?;

        self.next_texture_id += 1;
        let id = TextureId::new(self.next_texture_id);
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            log::debug!("Release of unknown texture {:?}", id);
        }
        // Meshes may still bind it; force a rebuild.
        if let Some(attached) = self.attached.as_mut() {
            attached.mesh_revision = None;
            attached.meshes.clear();
        }
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let (Some(ctx), Some(attached)) = (self.context.as_mut(), self.attached.as_mut()) else {
            return Err(RenderError::Detached);
        };

        if attached.mesh_revision != Some(frame.scene.revision()) {
            attached.meshes =
                Self::upload_meshes(ctx, &attached.pipeline, &self.textures, frame.scene);
            attached.mesh_revision = Some(frame.scene.revision());
            log::debug!(
                "Uploaded {} meshes for scene revision {}",
                attached.meshes.len(),
                frame.scene.revision()
            );
        }

        attached.pipeline.update_camera(
            ctx,
            CameraUniform::new(frame.view_proj.to_cols_array_2d(), frame.eye.to_array()),
        );
        attached
            .pipeline
            .update_lights(ctx, light_uniform(frame.scene.lights()));

        let output = match ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                ctx.reconfigure();
                return Err(RenderError::SurfaceLost);
            }
            Err(e) => return Err(GpuError::from(e).into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        attached.pipeline.render(
            &mut encoder,
            &view,
            &attached.depth,
            ClearColor::from_rgb8(frame.scene.background()),
            &attached.meshes,
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = None;
        self.textures.clear();
        self.context = None;
        log::debug!("Detached wgpu backend");
    }
}
