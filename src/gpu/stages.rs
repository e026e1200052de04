//! The simulation stages.
//!
//! Each stage wraps a [`ShaderPass`] and records its draws into the caller's
//! encoder. Everything a stage needs beyond its inputs comes in through an
//! explicit [`PassContext`]; stages hold no global or shared state.

use glam::Vec2;

use super::fields::{DoubleField, Field};
use super::pass::{PassDescriptor, PassUniforms, ShaderPass, VertexStage, ADDITIVE};
use super::FIELD_FORMAT;
use crate::grid::GridLayout;
use crate::pointer::ForceInput;

/// Per-step state shared by every stage.
pub struct PassContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub sampler: &'a wgpu::Sampler,
    pub layout: GridLayout,
    /// Boundary inset for this step; identical for every stage.
    pub boundary: Vec2,
    pub dt: f32,
}

impl PassContext<'_> {
    fn uniforms(&self) -> PassUniforms {
        PassUniforms::grid(
            self.layout.cell_scale,
            self.boundary,
            self.layout.fbo_size.as_vec2(),
            self.dt,
        )
    }
}

const CLEAR: wgpu::LoadOp<wgpu::Color> = wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT);

fn field_pass(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    label: &str,
    fragment: &str,
    textures: u32,
) -> ShaderPass {
    ShaderPass::new(
        device,
        &PassDescriptor {
            label,
            module,
            vertex: VertexStage::Face,
            fragment,
            textures,
            format: FIELD_FORMAT,
            blend: None,
        },
    )
}

/// Semi-Lagrangian self-advection, plain or BFECC.
pub struct Advection {
    pass: ShaderPass,
}

impl Advection {
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        Self {
            pass: field_pass(device, module, "Advection", "fs_advect", 1),
        }
    }

    pub fn run(
        &self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        src: &Field,
        dst: &Field,
        bfecc: bool,
    ) {
        let uniforms = PassUniforms {
            bfecc: bfecc as u32,
            ..ctx.uniforms()
        };
        self.pass.set_uniforms(ctx.queue, &uniforms);
        self.pass
            .draw(ctx.device, encoder, ctx.sampler, &[src.view()], dst.view(), CLEAR);
    }
}

/// Additive force splat at the pointer.
pub struct ExternalForce {
    pass: ShaderPass,
}

impl ExternalForce {
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        Self {
            pass: ShaderPass::new(
                device,
                &PassDescriptor {
                    label: "External Force",
                    module,
                    vertex: VertexStage::Force,
                    fragment: "fs_force",
                    textures: 0,
                    format: FIELD_FORMAT,
                    blend: Some(ADDITIVE),
                },
            ),
        }
    }

    /// Blend the splat onto `dst`, keeping its contents.
    pub fn run(
        &self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        dst: &Field,
        input: &ForceInput,
    ) {
        let uniforms = PassUniforms {
            force: input.force.to_array(),
            center: input.center.to_array(),
            scale: input.scale.to_array(),
            ..ctx.uniforms()
        };
        self.pass.set_uniforms(ctx.queue, &uniforms);
        self.pass
            .draw(ctx.device, encoder, ctx.sampler, &[], dst.view(), wgpu::LoadOp::Load);
    }
}

/// Implicit viscous diffusion by Jacobi iteration.
pub struct Viscous {
    pass: ShaderPass,
}

impl Viscous {
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        Self {
            pass: field_pass(device, module, "Viscous", "fs_viscous", 2),
        }
    }

    /// Diffuse `src` through the `scratch` pair and return the buffer holding
    /// the result. The first iterate is primed with `src`.
    pub fn run<'f>(
        &self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        src: &Field,
        scratch: &'f DoubleField,
        viscosity: f32,
        iterations: u32,
    ) -> &'f Field {
        encoder.copy_texture_to_texture(
            src.texture().as_image_copy(),
            scratch.get(0).texture().as_image_copy(),
            src.texture().size(),
        );

        let uniforms = PassUniforms {
            viscosity,
            ..ctx.uniforms()
        };
        self.pass.set_uniforms(ctx.queue, &uniforms);
        for i in 0..iterations {
            let (read, write) = scratch.iteration(i);
            self.pass.draw(
                ctx.device,
                encoder,
                ctx.sampler,
                &[src.view(), read.view()],
                write.view(),
                CLEAR,
            );
        }
        scratch.result(iterations)
    }
}

/// Central-difference divergence, divided by `dt`.
pub struct Divergence {
    pass: ShaderPass,
}

impl Divergence {
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        Self {
            pass: field_pass(device, module, "Divergence", "fs_divergence", 1),
        }
    }

    pub fn run(
        &self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        velocity: &Field,
        dst: &Field,
    ) {
        self.pass.set_uniforms(ctx.queue, &ctx.uniforms());
        self.pass
            .draw(ctx.device, encoder, ctx.sampler, &[velocity.view()], dst.view(), CLEAR);
    }
}

/// Jacobi solve of the pressure Poisson equation.
///
/// Buffer 0 of the pressure pair carries over between steps as the initial
/// guess.
pub struct Poisson {
    pass: ShaderPass,
}

impl Poisson {
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        Self {
            pass: field_pass(device, module, "Poisson", "fs_poisson", 2),
        }
    }

    pub fn run<'f>(
        &self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        divergence: &Field,
        pressure: &'f DoubleField,
        iterations: u32,
    ) -> &'f Field {
        self.pass.set_uniforms(ctx.queue, &ctx.uniforms());
        for i in 0..iterations {
            let (read, write) = pressure.iteration(i);
            self.pass.draw(
                ctx.device,
                encoder,
                ctx.sampler,
                &[read.view(), divergence.view()],
                write.view(),
                CLEAR,
            );
        }
        pressure.result(iterations)
    }
}

/// Subtract the pressure gradient from the velocity.
pub struct Pressure {
    pass: ShaderPass,
}

impl Pressure {
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        Self {
            pass: field_pass(device, module, "Pressure", "fs_pressure", 2),
        }
    }

    pub fn run(
        &self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        pressure: &Field,
        velocity: &Field,
        dst: &Field,
    ) {
        self.pass.set_uniforms(ctx.queue, &ctx.uniforms());
        self.pass.draw(
            ctx.device,
            encoder,
            ctx.sampler,
            &[pressure.view(), velocity.view()],
            dst.view(),
            CLEAR,
        );
    }
}
