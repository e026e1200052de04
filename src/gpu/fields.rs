//! GPU-resident simulation fields.
//!
//! Every field is an `Rgba16Float` texture of the grid size. Velocity, viscous
//! scratch and pressure are double-buffered; divergence is single. A
//! [`FieldStore`] is allocated as a whole inside an error scope, so a resize
//! either yields a complete new store or an error and the old store stays
//! untouched.

use super::{with_error_scope, FIELD_FORMAT};
use crate::error::GpuError;
use crate::grid::{GridLayout, PingPong};

/// One field texture and its default view.
pub struct Field {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Field {
    fn new(device: &wgpu::Device, label: &str, layout: &GridLayout) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: layout.width(),
                height: layout.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FIELD_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Two same-sized buffers of one field.
pub struct DoubleField {
    buffers: [Field; 2],
}

impl DoubleField {
    fn new(device: &wgpu::Device, label: &str, layout: &GridLayout) -> Self {
        Self {
            buffers: [
                Field::new(device, &format!("{} 0", label), layout),
                Field::new(device, &format!("{} 1", label), layout),
            ],
        }
    }

    pub fn get(&self, index: usize) -> &Field {
        &self.buffers[index]
    }

    /// Buffers read and written by Jacobi iteration `i`.
    pub fn iteration(&self, i: u32) -> (&Field, &Field) {
        let pp = PingPong::for_iteration(i);
        (&self.buffers[pp.read], &self.buffers[pp.write])
    }

    /// Buffer holding the result after `iterations` passes.
    pub fn result(&self, iterations: u32) -> &Field {
        &self.buffers[PingPong::last(iterations)]
    }

    fn destroy(&self) {
        for field in &self.buffers {
            field.destroy();
        }
    }
}

/// The fixed set of named fields for one grid size.
pub struct FieldStore {
    layout: GridLayout,
    /// `0`: velocity state, `1`: advected velocity.
    pub velocity: DoubleField,
    pub viscous: DoubleField,
    pub divergence: Field,
    pub pressure: DoubleField,
}

impl FieldStore {
    /// Allocate every field at rest.
    ///
    /// Fails with [`GpuError::Allocation`] if the device rejects any texture.
    pub fn allocate(device: &wgpu::Device, layout: GridLayout) -> Result<Self, GpuError> {
        let store = with_error_scope(device, || Self {
            layout,
            velocity: DoubleField::new(device, "Velocity", &layout),
            viscous: DoubleField::new(device, "Viscous", &layout),
            divergence: Field::new(device, "Divergence", &layout),
            pressure: DoubleField::new(device, "Pressure", &layout),
        })?;

        log::debug!(
            "allocated field store {}x{}",
            layout.width(),
            layout.height()
        );
        Ok(store)
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Current velocity state, read by the compositor.
    pub fn state(&self) -> &Field {
        self.velocity.get(0)
    }

    pub fn advected(&self) -> &Field {
        self.velocity.get(1)
    }

    /// Release every texture. The store must not be used afterwards.
    pub fn destroy(&self) {
        self.velocity.destroy();
        self.viscous.destroy();
        self.divergence.destroy();
        self.pressure.destroy();
    }
}
