//! Lit mesh pipeline for the room scene.
//!
//! Draws world-space triangle meshes with an ambient + directional light.
//! Opaque meshes are drawn first with depth writes, translucent meshes after
//! with alpha blending and depth writes disabled.

use wgpu::util::DeviceExt;

use super::{BindGroupLayoutBuilder, PipelineBuilder};
use crate::bindings::mesh as bind;
use crate::config::ClearColor;
use crate::context::GpuContext;
use crate::error::Result;
use crate::texture::{DepthTexture, Texture};
use crate::uniform::{CameraUniform, LightUniform, MaterialUniform};
use crate::vertex::MeshVertex;

/// How a mesh is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    Translucent,
}

/// A mesh uploaded to the GPU together with its material bind group.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub material_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub blend: BlendMode,
}

pub struct MeshPipeline {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    fallback_texture: Texture,
}

impl MeshPipeline {
    pub fn new(ctx: &GpuContext) -> Result<Self> {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Mesh Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/mesh.wgsl").into()),
            });

        let camera_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[CameraUniform::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let light_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Light Uniform Buffer"),
                contents: bytemuck::cast_slice(&[LightUniform::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let frame_layout = BindGroupLayoutBuilder::new(&ctx.device)
            .with_label("Frame Bind Group Layout")
            .add_uniform_buffer(
                bind::CAMERA_BINDING,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )
            .add_uniform_buffer(bind::LIGHT_BINDING, wgpu::ShaderStages::FRAGMENT)
            .build();

        let material_layout = BindGroupLayoutBuilder::new(&ctx.device)
            .with_label("Material Bind Group Layout")
            .add_uniform_buffer(bind::MATERIAL_BINDING, wgpu::ShaderStages::FRAGMENT)
            .add_texture_2d(bind::TEXTURE_BINDING, wgpu::ShaderStages::FRAGMENT)
            .add_sampler(bind::SAMPLER_BINDING, wgpu::ShaderStages::FRAGMENT)
            .build();

        let frame_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: bind::CAMERA_BINDING,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bind::LIGHT_BINDING,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let opaque_pipeline = PipelineBuilder::new(&ctx.device, ctx.format(), &shader)
            .with_label("Opaque Mesh Pipeline")
            .with_vertex_buffer(MeshVertex::desc())
            .with_bind_group_layouts(&[&frame_layout, &material_layout])
            .with_blend_state(wgpu::BlendState::REPLACE)
            .with_depth(DepthTexture::FORMAT, true)
            .build();

        let translucent_pipeline = PipelineBuilder::new(&ctx.device, ctx.format(), &shader)
            .with_label("Translucent Mesh Pipeline")
            .with_vertex_buffer(MeshVertex::desc())
            .with_bind_group_layouts(&[&frame_layout, &material_layout])
            .with_blend_state(wgpu::BlendState::ALPHA_BLENDING)
            .with_depth(DepthTexture::FORMAT, false)
            .build();

        let fallback_texture = Texture::white(ctx)?;

        Ok(Self {
            opaque_pipeline,
            translucent_pipeline,
            camera_buffer,
            light_buffer,
            frame_bind_group,
            material_layout,
            fallback_texture,
        })
    }

    /// Upload a mesh. `texture` is sampled only when the material asks for it;
    /// untextured meshes bind the 1x1 white fallback.
    pub fn create_mesh(
        &self,
        ctx: &GpuContext,
        vertices: &[MeshVertex],
        indices: &[u16],
        material: MaterialUniform,
        texture: Option<&Texture>,
        blend: BlendMode,
    ) -> GpuMesh {
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let material_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material Uniform Buffer"),
                contents: bytemuck::cast_slice(&[material]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let texture = texture.unwrap_or(&self.fallback_texture);
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: bind::MATERIAL_BINDING,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bind::TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: bind::SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
            material_buffer,
            bind_group,
            blend,
        }
    }

    pub fn update_camera(&self, ctx: &GpuContext, camera: CameraUniform) {
        ctx.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));
    }

    pub fn update_lights(&self, ctx: &GpuContext, lights: LightUniform) {
        ctx.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[lights]));
    }

    /// Clear the target and draw `meshes`, opaque before translucent.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: &DepthTexture,
        clear_color: ClearColor,
        meshes: &[GpuMesh],
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(bind::FRAME_GROUP, &self.frame_bind_group, &[]);

        for (mode, pipeline) in [
            (BlendMode::Opaque, &self.opaque_pipeline),
            (BlendMode::Translucent, &self.translucent_pipeline),
        ] {
            render_pass.set_pipeline(pipeline);
            for mesh in meshes.iter().filter(|m| m.blend == mode) {
                render_pass.set_bind_group(bind::MATERIAL_GROUP, &mesh.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }
        }
    }
}
