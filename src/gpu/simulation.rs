//! One simulation step on the GPU.
//!
//! ```text
//! state ─advect─▶ advected ─force(+)─▶ advected ─viscous?─▶ v
//!   v ─divergence─▶ div ─poisson×N─▶ p
//!   (p, v) ─subtract gradient─▶ state
//! ```

use glam::{UVec2, Vec2};

use super::fields::{Field, FieldStore};
use super::stages::{
    Advection, Divergence, ExternalForce, PassContext, Poisson, Pressure, Viscous,
};
use super::{pass, read_texture, GpuContext};
use crate::config::EtherConfig;
use crate::cpu::HostField;
use crate::error::GpuError;
use crate::grid::GridLayout;
use crate::pointer::ForceInput;

/// Owns the field store and every stage.
pub struct Simulation {
    fields: FieldStore,
    sampler: wgpu::Sampler,
    advection: Advection,
    external_force: ExternalForce,
    viscous: Viscous,
    divergence: Divergence,
    poisson: Poisson,
    pressure: Pressure,
    disposed: bool,
}

impl Simulation {
    /// Allocate the fields for `layout` and build every stage from `module`.
    pub fn new(
        gpu: &GpuContext,
        module: &wgpu::ShaderModule,
        layout: GridLayout,
    ) -> Result<Self, GpuError> {
        let device = &gpu.device;
        let fields = FieldStore::allocate(device, layout)?;

        Ok(Self {
            fields,
            sampler: pass::field_sampler(device),
            advection: Advection::new(device, module),
            external_force: ExternalForce::new(device, module),
            viscous: Viscous::new(device, module),
            divergence: Divergence::new(device, module),
            poisson: Poisson::new(device, module),
            pressure: Pressure::new(device, module),
            disposed: false,
        })
    }

    pub fn layout(&self) -> GridLayout {
        self.fields.layout()
    }

    /// Reallocate every field for `layout`.
    ///
    /// Returns `Ok(false)` if the layout is unchanged. On failure the previous
    /// fields are kept and keep rendering.
    pub fn resize(&mut self, gpu: &GpuContext, layout: GridLayout) -> Result<bool, GpuError> {
        if self.disposed || layout == self.fields.layout() {
            return Ok(false);
        }
        let fields = FieldStore::allocate(&gpu.device, layout)?;
        let old = std::mem::replace(&mut self.fields, fields);
        old.destroy();
        Ok(true)
    }

    /// Record one step into `encoder`.
    pub fn step(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        config: &EtherConfig,
        force: &ForceInput,
    ) {
        if self.disposed {
            return;
        }

        let layout = self.fields.layout();
        let ctx = PassContext {
            device: &gpu.device,
            queue: &gpu.queue,
            sampler: &self.sampler,
            layout,
            boundary: layout.boundary_space(config.boundary_mode),
            dt: config.timestep,
        };
        let fields = &self.fields;

        self.advection
            .run(&ctx, encoder, fields.state(), fields.advected(), config.bfecc);
        self.external_force.run(&ctx, encoder, fields.advected(), force);

        let velocity = if config.is_viscous {
            self.viscous.run(
                &ctx,
                encoder,
                fields.advected(),
                &fields.viscous,
                config.viscosity,
                config.viscous_iterations,
            )
        } else {
            fields.advected()
        };

        self.divergence.run(&ctx, encoder, velocity, &fields.divergence);
        let pressure = self.poisson.run(
            &ctx,
            encoder,
            &fields.divergence,
            &fields.pressure,
            config.poisson_iterations,
        );
        self.pressure.run(&ctx, encoder, pressure, velocity, fields.state());
    }

    /// The velocity state after the last step.
    pub fn velocity(&self) -> &Field {
        self.fields.state()
    }

    /// Copy the velocity state to the host, bottom row first.
    pub fn read_velocity(&self, gpu: &GpuContext) -> Result<HostField<Vec2>, GpuError> {
        let layout = self.fields.layout();
        let bytes = read_texture(&gpu.device, &gpu.queue, self.velocity().texture(), 8)?;

        let (w, h) = (layout.width() as usize, layout.height() as usize);
        let channel = |o: usize| half::f16::from_le_bytes([bytes[o], bytes[o + 1]]).to_f32();
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            // Texture rows are top-down.
            let row = (h - 1 - y) * w * 8;
            for x in 0..w {
                let o = row + x * 8;
                data.push(Vec2::new(channel(o), channel(o + 2)));
            }
        }

        HostField::from_vec(UVec2::new(w as u32, h as u32), data)
            .ok_or_else(|| GpuError::BufferMapping("velocity readback size mismatch".into()))
    }

    /// Destroy every field texture. Later calls do nothing.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.fields.destroy();
            self.disposed = true;
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
