//! Palette lookup texture and the final composite pass.
//!
//! The composite maps local velocity magnitude to a palette color and blends
//! it over the background by that same magnitude:
//!
//! ```text
//! lenv = clamp(|v|, 0, 1)
//! out  = mix(background, palette(lenv), lenv)
//! ```

use super::fields::Field;
use super::pass::{self, PassDescriptor, PassUniforms, ShaderPass, VertexStage};
use super::{with_error_scope, GpuContext};
use crate::color::Color;
use crate::error::GpuError;
use crate::palette::Palette;

/// Format of the palette lookup texture. Non-sRGB so texels equal the hex bytes.
pub const PALETTE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A `width x 1` palette lookup texture.
pub struct PaletteTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
}

impl PaletteTexture {
    pub fn new(gpu: &GpuContext, palette: &Palette) -> Result<Self, GpuError> {
        let texels = palette.lookup_texels();
        let size = wgpu::Extent3d {
            width: texels.width,
            height: 1,
            depth_or_array_layers: 1,
        };

        let texture = with_error_scope(&gpu.device, || {
            gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Palette Texture"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: PALETTE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        })?;

        gpu.queue.write_texture(
            texture.as_image_copy(),
            &texels.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texels.width * 4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            width: texels.width,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Owns the palette texture and the composite pipeline for one output format.
pub struct Compositor {
    pass: ShaderPass,
    sampler: wgpu::Sampler,
    palette: PaletteTexture,
    background: Color,
}

impl Compositor {
    /// Build the composite pass from the shared `module` for `format` targets.
    pub fn new(
        gpu: &GpuContext,
        module: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        palette: &Palette,
        background: Color,
    ) -> Result<Self, GpuError> {
        let pass = ShaderPass::new(
            &gpu.device,
            &PassDescriptor {
                label: "Composite",
                module,
                vertex: VertexStage::Face,
                fragment: "fs_color",
                textures: 2,
                format,
                blend: None,
            },
        );

        Ok(Self {
            pass,
            sampler: pass::field_sampler(&gpu.device),
            palette: PaletteTexture::new(gpu, palette)?,
            background,
        })
    }

    /// Replace the palette.
    ///
    /// The new texture is fully built before it is swapped in; the old one is
    /// destroyed only after the swap, so no frame samples a partial palette.
    pub fn set_palette(&mut self, gpu: &GpuContext, palette: &Palette) -> Result<(), GpuError> {
        let next = PaletteTexture::new(gpu, palette)?;
        let old = std::mem::replace(&mut self.palette, next);
        old.destroy();
        log::debug!("palette swapped, {} texels", self.palette.width());
        Ok(())
    }

    pub fn palette_width(&self) -> u32 {
        self.palette.width()
    }

    /// Record the composite of `velocity` into `target`, cleared to transparent first.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        velocity: &Field,
        target: &wgpu::TextureView,
    ) {
        let uniforms = PassUniforms {
            bg_color: self.background.to_unit(),
            ..Default::default()
        };
        self.pass.set_uniforms(&gpu.queue, &uniforms);
        self.pass.draw(
            &gpu.device,
            encoder,
            &self.sampler,
            &[velocity.view(), &self.palette.view],
            target,
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
        );
    }

    pub fn dispose(&self) {
        self.palette.destroy();
    }
}
