//! Host-side mirror of the simulation passes.
//!
//! Every GPU stage has a CPU counterpart here with the same stencils, the same
//! bilinear clamp-to-edge sampling and the same pass coverage rule: a texel is
//! written when its center lies inside the pass quad, `[bs, 1 - bs]` in UV
//! for the full-grid passes. Texels outside the quad end up at rest.
//!
//! Fields are stored bottom row first so UV `(0, 0)` is the lower-left texel
//! and +y points up, like the pointer and the velocity it produces.
//!
//! The mirror exists to check numeric properties without a GPU and to
//! benchmark the step; it is not used by the renderer.

use std::ops::{Add, Mul};

use glam::{UVec2, Vec2};

use crate::color::Color;
use crate::config::EtherConfig;
use crate::grid::{GridLayout, PingPong};
use crate::palette::PaletteTexels;
use crate::pointer::ForceInput;

/// Values a [`HostField`] can hold and filter.
pub trait Texel: Copy + Default + Add<Output = Self> + Mul<f32, Output = Self> {}

impl<T> Texel for T where T: Copy + Default + Add<Output = T> + Mul<f32, Output = T> {}

/// A 2D grid of texels, bottom row first.
#[derive(Debug, Clone, PartialEq)]
pub struct HostField<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Texel> HostField<T> {
    /// A field at rest.
    pub fn new(size: UVec2) -> Self {
        Self::new_filled(size, T::default())
    }

    /// A field with every texel set to `value`.
    pub fn new_filled(size: UVec2, value: T) -> Self {
        let size = size.max(UVec2::ONE);
        Self {
            width: size.x,
            height: size.y,
            data: vec![value; size.x as usize * size.y as usize],
        }
    }

    /// Build a field from raw rows, bottom row first.
    pub fn from_vec(size: UVec2, data: Vec<T>) -> Option<Self> {
        if size.x == 0 || size.y == 0 || data.len() != size.x as usize * size.y as usize {
            return None;
        }
        Some(Self {
            width: size.x,
            height: size.y,
            data,
        })
    }

    pub fn from_fn(size: UVec2, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut field = Self::new(size);
        for y in 0..field.height {
            for x in 0..field.width {
                field.set(x, y, f(x, y));
            }
        }
        field
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// UV of the center of texel `(x, y)`.
    #[inline]
    pub fn uv(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    fn clamped(&self, x: i64, y: i64) -> T {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(x, y)
    }

    /// Bilinear sample with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> T {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let xi = x0 as i64;
        let yi = y0 as i64;

        let a = self.clamped(xi, yi);
        let b = self.clamped(xi.saturating_add(1), yi);
        let c = self.clamped(xi, yi.saturating_add(1));
        let d = self.clamped(xi.saturating_add(1), yi.saturating_add(1));

        let bottom = a * (1.0 - tx) + b * tx;
        let top = c * (1.0 - tx) + d * tx;
        bottom * (1.0 - ty) + top * ty
    }

    /// Run a full-grid pass: `f` is called with the UV of every covered texel.
    fn pass(size: UVec2, boundary: Vec2, mut f: impl FnMut(Vec2) -> T) -> Self {
        let mut out = Self::new(size);
        for y in 0..out.height {
            for x in 0..out.width {
                let uv = out.uv(x, y);
                if covered(uv, boundary) {
                    out.set(x, y, f(uv));
                }
            }
        }
        out
    }
}

impl HostField<Vec2> {
    /// Largest velocity magnitude in the field.
    pub fn max_magnitude(&self) -> f32 {
        self.data.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    pub fn is_at_rest(&self) -> bool {
        self.data.iter().all(|v| *v == Vec2::ZERO)
    }
}

/// Whether a texel center at `uv` lies inside a quad inset by `boundary`.
#[inline]
pub fn covered(uv: Vec2, boundary: Vec2) -> bool {
    uv.x >= boundary.x && uv.x <= 1.0 - boundary.x && uv.y >= boundary.y && uv.y <= 1.0 - boundary.y
}

/// Semi-Lagrangian advection of `vel` along itself, optionally with BFECC.
pub fn advect(vel: &HostField<Vec2>, dt: f32, bfecc: bool, boundary: Vec2) -> HostField<Vec2> {
    let size = vel.size().as_vec2();
    let ratio = Vec2::splat(size.max_element()) / size;

    HostField::pass(vel.size(), boundary, |uv| {
        let vel_old = vel.sample(uv);
        let spot_old = uv - vel_old * dt * ratio;
        let vel_new1 = vel.sample(spot_old);
        if !bfecc {
            return vel_new1;
        }
        let spot_new2 = spot_old + vel_new1 * dt * ratio;
        let trace_error = spot_new2 - uv;
        let spot_new3 = uv - trace_error / 2.0;
        let vel_2 = vel.sample(spot_new3);
        let spot_old2 = spot_new3 - vel_2 * dt * ratio;
        vel.sample(spot_old2)
    })
}

/// Additively splat `input` into `vel` with a `(1 - |r|)^2` falloff.
pub fn apply_force(vel: &mut HostField<Vec2>, input: &ForceInput, cell_scale: Vec2) {
    let half_extent = input.scale * cell_scale;
    if half_extent.x <= 0.0 || half_extent.y <= 0.0 {
        return;
    }
    for y in 0..vel.height {
        for x in 0..vel.width {
            let clip = vel.uv(x, y) * 2.0 - Vec2::ONE;
            let circle = (clip - input.center) / half_extent;
            if circle.x.abs() > 1.0 || circle.y.abs() > 1.0 {
                continue;
            }
            let d = 1.0 - circle.length().min(1.0);
            let v = vel.get(x, y) + input.force * (d * d);
            vel.set(x, y, v);
        }
    }
}

/// One Jacobi iteration of implicit viscous diffusion.
pub fn viscous_iteration(
    old: &HostField<Vec2>,
    current: &HostField<Vec2>,
    viscosity: f32,
    dt: f32,
    px: Vec2,
    boundary: Vec2,
) -> HostField<Vec2> {
    let dx = Vec2::new(px.x * 2.0, 0.0);
    let dy = Vec2::new(0.0, px.y * 2.0);
    HostField::pass(old.size(), boundary, |uv| {
        let sum = current.sample(uv + dx)
            + current.sample(uv - dx)
            + current.sample(uv + dy)
            + current.sample(uv - dy);
        let v = old.sample(uv) * 4.0 + sum * (viscosity * dt);
        v / (4.0 * (1.0 + viscosity * dt))
    })
}

/// Central-difference divergence of `vel`, divided by `dt`.
pub fn divergence(vel: &HostField<Vec2>, dt: f32, px: Vec2, boundary: Vec2) -> HostField<f32> {
    let dx = Vec2::new(px.x, 0.0);
    let dy = Vec2::new(0.0, px.y);
    HostField::pass(vel.size(), boundary, |uv| {
        let x0 = vel.sample(uv - dx).x;
        let x1 = vel.sample(uv + dx).x;
        let y0 = vel.sample(uv - dy).y;
        let y1 = vel.sample(uv + dy).y;
        (x1 - x0 + y1 - y0) / 2.0 / dt
    })
}

/// One Jacobi iteration of the pressure Poisson equation.
pub fn poisson_iteration(
    pressure: &HostField<f32>,
    div: &HostField<f32>,
    px: Vec2,
    boundary: Vec2,
) -> HostField<f32> {
    let dx = Vec2::new(px.x * 2.0, 0.0);
    let dy = Vec2::new(0.0, px.y * 2.0);
    HostField::pass(pressure.size(), boundary, |uv| {
        let p = pressure.sample(uv + dx)
            + pressure.sample(uv - dx)
            + pressure.sample(uv + dy)
            + pressure.sample(uv - dy);
        p / 4.0 - div.sample(uv)
    })
}

/// Subtract half the pressure gradient, scaled by `dt`, from `vel`.
pub fn subtract_gradient(
    pressure: &HostField<f32>,
    vel: &HostField<Vec2>,
    dt: f32,
    px: Vec2,
    boundary: Vec2,
) -> HostField<Vec2> {
    let dx = Vec2::new(px.x, 0.0);
    let dy = Vec2::new(0.0, px.y);
    HostField::pass(vel.size(), boundary, |uv| {
        let grad = Vec2::new(
            pressure.sample(uv + dx) - pressure.sample(uv - dx),
            pressure.sample(uv + dy) - pressure.sample(uv - dy),
        ) * 0.5;
        vel.sample(uv) - grad * dt
    })
}

/// Composite `vel` into an RGBA8 image of `size`, top row first.
pub fn composite(
    vel: &HostField<Vec2>,
    palette: &PaletteTexels,
    background: Color,
    size: UVec2,
) -> Vec<[u8; 4]> {
    let bg = background.to_unit();
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;

    let mut out = Vec::with_capacity(size.x as usize * size.y as usize);
    for row in 0..size.y {
        for x in 0..size.x {
            let uv = Vec2::new(
                (x as f32 + 0.5) / size.x as f32,
                1.0 - (row as f32 + 0.5) / size.y as f32,
            );
            let lenv = vel.sample(uv).length().clamp(0.0, 1.0);
            let c = palette.sample(lenv);
            let mix = |a: f32, b: f32| a + (b - a) * lenv;
            out.push([
                to_byte(mix(bg[0], c[0])),
                to_byte(mix(bg[1], c[1])),
                to_byte(mix(bg[2], c[2])),
                to_byte(mix(bg[3], c[3])),
            ]);
        }
    }
    out
}

/// The whole pipeline on the host, buffer for buffer like the GPU version.
#[derive(Debug, Clone)]
pub struct HostSimulation {
    layout: GridLayout,
    velocity: HostField<Vec2>,
    viscous: [HostField<Vec2>; 2],
    pressure: [HostField<f32>; 2],
}

impl HostSimulation {
    pub fn new(config: &EtherConfig, container: UVec2) -> Self {
        let layout = GridLayout::new(config.resolution, container);
        let size = layout.fbo_size;
        Self {
            layout,
            velocity: HostField::new(size),
            viscous: [HostField::new(size), HostField::new(size)],
            pressure: [HostField::new(size), HostField::new(size)],
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Current velocity state.
    pub fn velocity(&self) -> &HostField<Vec2> {
        &self.velocity
    }

    /// Replace the velocity state, e.g. to seed a test.
    pub fn set_velocity(&mut self, velocity: HostField<Vec2>) {
        if velocity.size() == self.layout.fbo_size {
            self.velocity = velocity;
        }
    }

    /// Re-derive the grid; all fields restart at rest if the size changed.
    pub fn resize(&mut self, config: &EtherConfig, container: UVec2) {
        let layout = GridLayout::new(config.resolution, container);
        if layout != self.layout {
            log::debug!("host grid resized to {}x{}", layout.width(), layout.height());
            *self = Self::new(config, container);
        }
    }

    /// One step: advect, force, optional viscosity, divergence, pressure solve, project.
    pub fn step(&mut self, config: &EtherConfig, force: &ForceInput) {
        let dt = config.timestep;
        let px = self.layout.cell_scale;
        let boundary = self.layout.boundary_space(config.boundary_mode);

        let mut advected = advect(&self.velocity, dt, config.bfecc, boundary);
        apply_force(&mut advected, force, px);

        let vel = if config.is_viscous {
            self.viscous[0] = advected.clone();
            for i in 0..config.viscous_iterations {
                let pp = PingPong::for_iteration(i);
                self.viscous[pp.write] = viscous_iteration(
                    &advected,
                    &self.viscous[pp.read],
                    config.viscosity,
                    dt,
                    px,
                    boundary,
                );
            }
            self.viscous[PingPong::last(config.viscous_iterations)].clone()
        } else {
            advected
        };

        let div = divergence(&vel, dt, px, boundary);
        for i in 0..config.poisson_iterations {
            let pp = PingPong::for_iteration(i);
            self.pressure[pp.write] = poisson_iteration(&self.pressure[pp.read], &div, px, boundary);
        }
        let pressure = &self.pressure[PingPong::last(config.poisson_iterations)];

        self.velocity = subtract_gradient(pressure, &vel, dt, px, boundary);
    }
}
