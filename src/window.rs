//! Windowed runner built on winit.
//!
//! Keys: `Space` pauses and resumes, `C` cycles palette presets, `S` logs stats.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::EtherConfig;
use crate::error::EtherError;
use crate::ether::{LiquidEther, PaletteSender};
use crate::palette::{Palette, PRESETS};

type OnReady = Box<dyn FnOnce(PaletteSender)>;

struct App {
    config: EtherConfig,
    window: Option<Arc<Window>>,
    ether: Option<LiquidEther>,
    on_ready: Option<OnReady>,
    preset: usize,
    error: Option<EtherError>,
}

impl App {
    fn new(config: EtherConfig, on_ready: Option<OnReady>) -> Self {
        Self {
            config,
            window: None,
            ether: None,
            on_ready,
            preset: 0,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EtherError) {
        log::error!("{}", error);
        if let Some(ether) = &mut self.ether {
            ether.dispose();
        }
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EtherError> {
        let attrs = Window::default_attributes()
            .with_title("LiquidEther")
            .with_transparent(true)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let ether = pollster::block_on(LiquidEther::with_window(window.clone(), self.config.clone()))?;
        if let Some(on_ready) = self.on_ready.take() {
            on_ready(ether.palette_sender());
        }

        window.request_redraw();
        self.window = Some(window);
        self.ether = Some(ether);
        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent) -> Result<(), EtherError> {
        if event.state != ElementState::Pressed || event.repeat {
            return Ok(());
        }
        let Some(ether) = &mut self.ether else {
            return Ok(());
        };

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Space) => {
                if ether.is_running() {
                    ether.pause();
                } else {
                    ether.start();
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            PhysicalKey::Code(KeyCode::KeyC) => {
                self.preset = (self.preset + 1) % PRESETS.len();
                let (name, colors) = PRESETS[self.preset];
                ether.set_palette(&Palette::parse(colors)?)?;
                log::info!("palette: {}", name);
            }
            PhysicalKey::Code(KeyCode::KeyS) => {
                if let Some(layout) = ether.layout() {
                    log::info!(
                        "frame {} at {:.1} fps, grid {}x{}, auto {}",
                        ether.frame_count(),
                        ether.fps(),
                        layout.width(),
                        layout.height(),
                        if ether.is_auto_active() { "on" } else { "off" }
                    );
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(ether) = &mut self.ether {
                    ether.dispose();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ether) = &mut self.ether {
                    if let Err(e) = ether.resize_to(size.width, size.height) {
                        log::warn!("resize failed, keeping previous grid: {}", e);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(ether) = &mut self.ether {
                    ether.pointer_moved_px(position.x, position.y);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(ether) = &mut self.ether {
                    ether.pointer_left();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Err(e) = self.handle_key(&event) {
                    log::warn!("{}", e);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(ether) = &mut self.ether else {
                    return;
                };
                if let Err(e) = ether.frame() {
                    self.fail(event_loop, e);
                    return;
                }
                if ether.is_running() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the effect until it is closed.
pub fn run(config: EtherConfig) -> Result<(), EtherError> {
    run_app(config, None)
}

/// Like [`run`], handing a [`PaletteSender`] to `on_ready` once the effect is up.
pub fn run_with<F>(config: EtherConfig, on_ready: F) -> Result<(), EtherError>
where
    F: FnOnce(PaletteSender) + 'static,
{
    run_app(config, Some(Box::new(on_ready)))
}

fn run_app(config: EtherConfig, on_ready: Option<OnReady>) -> Result<(), EtherError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, on_ready);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
