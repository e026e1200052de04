//! The LiquidEther manager.
//!
//! Owns the GPU context, the output target (a window surface or an offscreen
//! texture), the simulation, the compositor, the pointer, the auto-driver and
//! the frame clock. All work happens on the thread that owns the manager,
//! strictly between frames. The one cross-thread entry point is the
//! [`PaletteSender`]: a palette sent through it waits in a single slot and is
//! applied at the start of the next frame. Later sends overwrite earlier ones.
//!
//! ```ignore
//! let mut ether = pollster::block_on(LiquidEther::headless(320, 240, EtherConfig::default()))?;
//! for _ in 0..60 {
//!     ether.frame()?;
//! }
//! ether.read_frame()?.save_png("ether.png")?;
//! ether.dispose();
//! ```

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Instant;

use glam::{UVec2, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::window::Window;

use crate::color::Color;
use crate::config::EtherConfig;
use crate::cpu::HostField;
use crate::driver::AutoDriver;
use crate::error::{ConfigError, EtherError, GpuError};
use crate::frame::Frame;
use crate::gpu::{self, shaders, Compositor, GpuContext, Simulation};
use crate::grid::GridLayout;
use crate::palette::Palette;
use crate::pointer::Pointer;
use crate::time::FrameClock;

/// Output format of headless instances. Non-sRGB so colors equal their hex bytes.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Single-slot palette hand-off; holds at most the latest palette sent.
#[derive(Debug, Default)]
struct PaletteMailbox {
    slot: Arc<Mutex<Option<Palette>>>,
}

impl PaletteMailbox {
    fn sender(&self) -> PaletteSender {
        PaletteSender {
            slot: Arc::downgrade(&self.slot),
        }
    }

    fn take(&self) -> Option<Palette> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Cloneable handle for handing palettes to a [`LiquidEther`] from any thread.
#[derive(Debug, Clone)]
pub struct PaletteSender {
    slot: Weak<Mutex<Option<Palette>>>,
}

impl PaletteSender {
    /// Parse and queue a palette. Returns `Ok(false)` if the instance is gone.
    pub fn send<S: AsRef<str>>(&self, colors: &[S]) -> Result<bool, ConfigError> {
        let palette = Palette::parse(colors)?;
        Ok(self.send_palette(palette))
    }

    /// Queue an already-parsed palette. Returns `false` if the instance is gone.
    pub fn send_palette(&self, palette: Palette) -> bool {
        match self.slot.upgrade() {
            Some(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(palette);
                true
            }
            None => false,
        }
    }
}

enum OutputTarget {
    Surface {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
        size: UVec2,
    },
}

struct FrameOutput {
    view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl FrameOutput {
    fn present(self) {
        if let Some(texture) = self.surface_texture {
            texture.present();
        }
    }
}

fn window_size(window: &Window) -> UVec2 {
    let size = window.inner_size();
    UVec2::new(size.width, size.height).max(UVec2::ONE)
}

fn create_offscreen(device: &wgpu::Device, size: UVec2) -> Result<wgpu::Texture, GpuError> {
    gpu::with_error_scope(device, || {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    })
}

impl OutputTarget {
    fn format(&self) -> wgpu::TextureFormat {
        match self {
            OutputTarget::Surface { config, .. } => config.format,
            OutputTarget::Offscreen { .. } => OFFSCREEN_FORMAT,
        }
    }

    /// Size the container currently reports.
    fn container_size(&self) -> UVec2 {
        match self {
            OutputTarget::Surface { window, .. } => window_size(window),
            OutputTarget::Offscreen { size, .. } => *size,
        }
    }

    fn resize(&mut self, gpu: &GpuContext, size: UVec2) -> Result<(), GpuError> {
        match self {
            OutputTarget::Surface { surface, config, .. } => {
                if config.width != size.x || config.height != size.y {
                    config.width = size.x;
                    config.height = size.y;
                    surface.configure(&gpu.device, config);
                }
            }
            OutputTarget::Offscreen { texture, size: current } => {
                if *current != size {
                    let next = create_offscreen(&gpu.device, size)?;
                    let old = std::mem::replace(texture, next);
                    old.destroy();
                    *current = size;
                }
            }
        }
        Ok(())
    }

    /// Get the texture to draw this frame into. `None` skips the frame.
    fn acquire(&self, gpu: &GpuContext) -> Result<Option<FrameOutput>, GpuError> {
        match self {
            OutputTarget::Surface { surface, config, .. } => match surface.get_current_texture() {
                Ok(frame) => {
                    let view = frame
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    Ok(Some(FrameOutput {
                        view,
                        surface_texture: Some(frame),
                    }))
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    log::warn!("surface timed out, skipping frame");
                    Ok(None)
                }
                Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                    log::warn!("surface lost, reconfiguring");
                    surface.configure(&gpu.device, config);
                    Ok(None)
                }
                Err(e) => Err(GpuError::Surface(e)),
            },
            OutputTarget::Offscreen { texture, .. } => Ok(Some(FrameOutput {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                surface_texture: None,
            })),
        }
    }

    fn destroy(&self) {
        if let OutputTarget::Offscreen { texture, .. } = self {
            texture.destroy();
        }
    }
}

struct Resources {
    gpu: GpuContext,
    target: OutputTarget,
    simulation: Simulation,
    compositor: Compositor,
}

/// A running LiquidEther effect.
pub struct LiquidEther {
    config: EtherConfig,
    resources: Option<Resources>,
    pointer: Pointer,
    driver: AutoDriver,
    clock: FrameClock,
    running: bool,
    mailbox: PaletteMailbox,
}

impl LiquidEther {
    /// Render into `window`. The loop starts running immediately.
    ///
    /// The configuration is validated before any GPU work.
    pub async fn with_window(window: Arc<Window>, config: EtherConfig) -> Result<Self, EtherError> {
        config.validate()?;
        let palette = config.parsed_palette()?;
        let background = config.parsed_background()?;

        let instance = GpuContext::instance();
        let surface = instance.create_surface(window.clone())?;
        let gpu = GpuContext::request(&instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = window_size(&window);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.x,
            height: size.y,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);

        let target = OutputTarget::Surface {
            window,
            surface,
            config: surface_config,
        };
        Self::assemble(config, gpu, target, &palette, background)
    }

    /// Render into an offscreen `width x height` texture that can be read back.
    pub async fn headless(width: u32, height: u32, config: EtherConfig) -> Result<Self, EtherError> {
        config.validate()?;
        let palette = config.parsed_palette()?;
        let background = config.parsed_background()?;

        let instance = GpuContext::instance();
        let gpu = GpuContext::request(&instance, None).await?;

        let size = UVec2::new(width, height).max(UVec2::ONE);
        let texture = create_offscreen(&gpu.device, size)?;
        let target = OutputTarget::Offscreen { texture, size };
        Self::assemble(config, gpu, target, &palette, background)
    }

    fn assemble(
        config: EtherConfig,
        gpu: GpuContext,
        target: OutputTarget,
        palette: &Palette,
        background: Color,
    ) -> Result<Self, EtherError> {
        let layout = GridLayout::new(config.resolution, target.container_size());
        let module = shaders::create_module(&gpu.device);
        let simulation = Simulation::new(&gpu, &module, layout)?;
        let compositor = Compositor::new(&gpu, &module, target.format(), palette, background)?;

        log::info!(
            "LiquidEther ready: grid {}x{}, {} palette colors, {:?} boundary",
            layout.width(),
            layout.height(),
            palette.len(),
            config.boundary_mode
        );

        let now = Instant::now();
        Ok(Self {
            pointer: Pointer::new(config.auto_intensity, config.takeover_duration),
            driver: AutoDriver::new(&config, now),
            clock: FrameClock::starting_at(now),
            running: true,
            resources: Some(Resources {
                gpu,
                target,
                simulation,
                compositor,
            }),
            config,
            mailbox: PaletteMailbox::default(),
        })
    }

    pub fn config(&self) -> &EtherConfig {
        &self.config
    }

    /// Reseed the auto-driver for reproducible motion.
    pub fn seed_auto_driver(&mut self, seed: u64) {
        self.driver = AutoDriver::with_rng(&self.config, Instant::now(), StdRng::seed_from_u64(seed));
    }

    /// Resume the loop. Does nothing once disposed.
    pub fn start(&mut self) {
        if self.resources.is_none() || self.running {
            return;
        }
        self.running = true;
        self.clock.resume_at(Instant::now());
        log::debug!("loop started");
    }

    /// Stop producing frames until [`start`](Self::start) is called.
    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.clock.pause_at(Instant::now());
            log::debug!("loop paused");
        }
    }

    /// Whether the loop should keep scheduling frames.
    pub fn is_running(&self) -> bool {
        self.running && self.resources.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    /// Run one simulation step and one composite, if running.
    pub fn frame(&mut self) -> Result<(), EtherError> {
        self.frame_at(Instant::now())
    }

    /// [`frame`](Self::frame) with an explicit timestamp for the pointer and driver.
    pub fn frame_at(&mut self, now: Instant) -> Result<(), EtherError> {
        if !self.running {
            return Ok(());
        }
        let Some(res) = self.resources.as_mut() else {
            return Ok(());
        };

        if let Some(palette) = self.mailbox.take() {
            res.compositor.set_palette(&res.gpu, &palette)?;
        }

        self.clock.tick_at(now);
        self.driver.update(&mut self.pointer, now);
        self.pointer.update(now);

        let layout = res.simulation.layout();
        let force = self.pointer.force_input(
            self.config.mouse_force,
            self.config.cursor_size,
            layout.cell_scale,
        );

        let Some(output) = res.target.acquire(&res.gpu)? else {
            return Ok(());
        };

        let mut encoder = res
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("LiquidEther Frame"),
            });
        res.simulation
            .step(&res.gpu, &mut encoder, &self.config, &force);
        res.compositor
            .render(&res.gpu, &mut encoder, res.simulation.velocity(), &output.view);
        res.gpu.queue.submit(Some(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Re-query the container size and resize to it.
    pub fn resize(&mut self) -> Result<(), EtherError> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(());
        };
        let size = res.target.container_size();
        self.resize_to(size.x, size.y)
    }

    /// Resize the output and the grid. Unchanged sizes do nothing.
    ///
    /// On allocation failure the error is returned and the previous grid keeps
    /// rendering.
    pub fn resize_to(&mut self, width: u32, height: u32) -> Result<(), EtherError> {
        let Some(res) = self.resources.as_mut() else {
            return Ok(());
        };
        let size = UVec2::new(width, height).max(UVec2::ONE);

        // Fields first: if they cannot be allocated the output keeps its size too.
        let layout = GridLayout::new(self.config.resolution, size);
        let regridded = res.simulation.resize(&res.gpu, layout)?;
        res.target.resize(&res.gpu, size)?;

        if regridded {
            log::debug!(
                "resized to {}x{}, grid {}x{}",
                size.x,
                size.y,
                layout.width(),
                layout.height()
            );
        }
        Ok(())
    }

    /// Parse and apply a new palette before the next frame.
    pub fn update_palette<S: AsRef<str>>(&mut self, colors: &[S]) -> Result<(), EtherError> {
        let palette = Palette::parse(colors)?;
        self.set_palette(&palette)
    }

    /// Swap in `palette`. Does nothing once disposed.
    pub fn set_palette(&mut self, palette: &Palette) -> Result<(), EtherError> {
        if let Some(res) = self.resources.as_mut() {
            res.compositor.set_palette(&res.gpu, palette)?;
        }
        Ok(())
    }

    /// A handle for queueing palettes from other threads.
    pub fn palette_sender(&self) -> PaletteSender {
        self.mailbox.sender()
    }

    /// A real pointer moved to `pos`, normalized to `[-1, 1]²` with +y up.
    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.pointer.user_moved(pos, Instant::now());
    }

    /// A real pointer moved to pixel `(x, y)` of the container, origin top-left.
    pub fn pointer_moved_px(&mut self, x: f64, y: f64) {
        let Some(res) = self.resources.as_ref() else {
            return;
        };
        let size = res.target.container_size();
        let nx = (x / size.x as f64) * 2.0 - 1.0;
        let ny = -((y / size.y as f64) * 2.0 - 1.0);
        self.pointer_moved(Vec2::new(nx as f32, ny as f32));
    }

    /// The real pointer left the container.
    pub fn pointer_left(&mut self) {
        self.pointer.user_left();
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Whether the auto-driver currently moves the force.
    pub fn is_auto_active(&self) -> bool {
        self.driver.is_active()
    }

    /// Read back the last composited frame. Headless instances only.
    pub fn read_frame(&self) -> Result<Frame, EtherError> {
        let res = self.resources.as_ref().ok_or(EtherError::Disposed)?;
        match &res.target {
            OutputTarget::Offscreen { texture, size } => {
                let pixels = gpu::read_texture(&res.gpu.device, &res.gpu.queue, texture, 4)?;
                Ok(Frame {
                    width: size.x,
                    height: size.y,
                    pixels,
                })
            }
            OutputTarget::Surface { .. } => Err(EtherError::ReadbackUnsupported),
        }
    }

    /// Host copy of the velocity field, bottom row first.
    pub fn read_velocity(&self) -> Result<HostField<Vec2>, EtherError> {
        let res = self.resources.as_ref().ok_or(EtherError::Disposed)?;
        Ok(res.simulation.read_velocity(&res.gpu)?)
    }

    /// Current grid, or `None` once disposed.
    pub fn layout(&self) -> Option<GridLayout> {
        self.resources.as_ref().map(|res| res.simulation.layout())
    }

    pub fn fbo_size(&self) -> Option<UVec2> {
        self.layout().map(|l| l.fbo_size)
    }

    pub fn cell_scale(&self) -> Option<Vec2> {
        self.layout().map(|l| l.cell_scale)
    }

    /// Width of the current palette lookup texture.
    pub fn palette_width(&self) -> Option<u32> {
        self.resources
            .as_ref()
            .map(|res| res.compositor.palette_width())
    }

    pub fn adapter_info(&self) -> Option<wgpu::AdapterInfo> {
        self.resources.as_ref().map(|res| res.gpu.adapter.get_info())
    }

    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    /// Frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.clock.frame()
    }

    /// Stop the loop and release every GPU resource. Later calls do nothing.
    pub fn dispose(&mut self) {
        self.running = false;
        if let Some(mut res) = self.resources.take() {
            res.simulation.dispose();
            res.compositor.dispose();
            res.target.destroy();
            log::info!("LiquidEther disposed after {} frames", self.clock.frame());
        }
    }
}

impl Drop for LiquidEther {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_keeps_latest_only() {
        let mailbox = PaletteMailbox::default();
        let sender = mailbox.sender();
        for preset in ["ether", "sunset", "ocean"] {
            assert!(sender.send_palette(Palette::preset(preset).unwrap()));
        }

        assert_eq!(mailbox.take(), Palette::preset("ocean"));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_sender_parses_before_queueing() {
        let mailbox = PaletteMailbox::default();
        let sender = mailbox.sender().clone();

        assert!(sender.send(&["nope"]).is_err());
        assert_eq!(mailbox.take(), None);

        assert_eq!(sender.send(&["#ff0000"]), Ok(true));
        assert_eq!(mailbox.take().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_sender_reports_dropped_instance() {
        let mailbox = PaletteMailbox::default();
        let sender = mailbox.sender();
        drop(mailbox);
        assert!(!sender.send_palette(Palette::default()));
    }
}
