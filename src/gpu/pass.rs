//! A single fullscreen (or splat) render pass.
//!
//! Every stage of the pipeline is a [`ShaderPass`] configured by a
//! [`PassDescriptor`]: which vertex stage and fragment entry point to use, how
//! many input textures it binds, the target format and blend state. The pass
//! owns its pipeline, bind group layout and uniform buffer; inputs and the
//! target are supplied per draw so the same pass can ping-pong between
//! buffers.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

/// Uniform block shared by every pass. Mirrors `PassUniforms` in the WGSL prelude.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct PassUniforms {
    /// Cell scale `(1 / w, 1 / h)`.
    pub px: [f32; 2],
    pub boundary_space: [f32; 2],
    pub fbo_size: [f32; 2],
    pub force: [f32; 2],
    pub center: [f32; 2],
    pub scale: [f32; 2],
    pub dt: f32,
    pub viscosity: f32,
    /// Non-zero selects BFECC advection.
    pub bfecc: u32,
    pub _pad: u32,
    pub bg_color: [f32; 4],
}

impl PassUniforms {
    /// Grid-dependent fields filled in, everything else zero.
    pub fn grid(px: Vec2, boundary_space: Vec2, fbo_size: Vec2, dt: f32) -> Self {
        Self {
            px: px.to_array(),
            boundary_space: boundary_space.to_array(),
            fbo_size: fbo_size.to_array(),
            dt,
            ..Default::default()
        }
    }
}

/// Vertex stage of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStage {
    /// Fullscreen quad inset by the boundary space.
    Face,
    /// Force splat quad around the pointer.
    Force,
}

impl VertexStage {
    fn entry_point(self) -> &'static str {
        match self {
            VertexStage::Face => "vs_face",
            VertexStage::Force => "vs_force",
        }
    }
}

/// Configuration for a [`ShaderPass`].
pub struct PassDescriptor<'a> {
    pub label: &'a str,
    pub module: &'a wgpu::ShaderModule,
    pub vertex: VertexStage,
    /// Fragment entry point in the shared module.
    pub fragment: &'a str,
    /// Number of input textures bound at bindings 2 and up.
    pub textures: u32,
    pub format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
}

/// One-plus-one additive blending on every channel.
pub const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// A configured render pipeline plus its uniform buffer.
pub struct ShaderPass {
    label: String,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    textures: u32,
}

impl ShaderPass {
    pub fn new(device: &wgpu::Device, desc: &PassDescriptor) -> Self {
        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        for i in 0..desc.textures {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Bind Group Layout", desc.label)),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", desc.label)),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", desc.label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: desc.module,
                entry_point: Some(desc.vertex.entry_point()),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: desc.module,
                entry_point: Some(desc.fragment),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.format,
                    blend: desc.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Uniforms", desc.label)),
            contents: bytemuck::bytes_of(&PassUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            label: desc.label.to_string(),
            pipeline,
            bind_group_layout,
            uniform_buffer,
            textures: desc.textures,
        }
    }

    /// Upload the uniforms used by every draw of this pass in the next submission.
    pub fn set_uniforms(&self, queue: &wgpu::Queue, uniforms: &PassUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record one draw reading `inputs` and writing `target`.
    ///
    /// `inputs.len()` must equal the texture count the pass was built with.
    pub fn draw(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        sampler: &wgpu::Sampler,
        inputs: &[&wgpu::TextureView],
        target: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
    ) {
        debug_assert_eq!(inputs.len() as u32, self.textures, "{} input count", self.label);

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: self.uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ];
        for (i, view) in inputs.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}

/// Linear, clamp-to-edge sampler used for every field and palette lookup.
pub fn field_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Field Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_16_aligned() {
        assert_eq!(std::mem::size_of::<PassUniforms>(), 80);
        assert_eq!(std::mem::size_of::<PassUniforms>() % 16, 0);
    }

    #[test]
    fn test_grid_uniforms() {
        let u = PassUniforms::grid(Vec2::new(0.5, 0.25), Vec2::ZERO, Vec2::new(2.0, 4.0), 0.014);
        assert_eq!(u.px, [0.5, 0.25]);
        assert_eq!(u.fbo_size, [2.0, 4.0]);
        assert_eq!(u.dt, 0.014);
        assert_eq!(u.bfecc, 0);
        assert_eq!(u.force, [0.0, 0.0]);
    }
}
