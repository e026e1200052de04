//! # LiquidEther
//!
//! A GPU fluid background effect. A 2D incompressible velocity field is
//! advanced every frame by a stable-fluids solver and composited into color
//! by mapping local speed through a palette gradient over a background.
//!
//! ## Quick Start
//!
//! ```ignore
//! use liquid_ether::prelude::*;
//!
//! fn main() -> Result<(), EtherError> {
//!     let config = EtherConfig::default()
//!         .with_palette(["#5227FF", "#FF9FFC", "#B19EEF"])
//!         .with_force(20.0, 100.0)
//!         .with_auto_demo(true);
//!     liquid_ether::window::run(config)
//! }
//! ```
//!
//! ## Headless
//!
//! ```ignore
//! let mut ether = pollster::block_on(LiquidEther::headless(400, 300, EtherConfig::default()))?;
//! ether.pointer_moved(Vec2::new(0.2, -0.1));
//! for _ in 0..30 {
//!     ether.frame()?;
//! }
//! ether.read_frame()?.save_png("ether.png")?;
//! ```
//!
//! ## Pipeline
//!
//! Each frame runs, in order:
//!
//! | Stage | Output |
//! |-------|--------|
//! | Advection (semi-Lagrangian, optional BFECC) | advected velocity |
//! | External force (additive splat at the pointer) | advected velocity |
//! | Viscous diffusion (Jacobi, optional) | diffused velocity |
//! | Divergence | scalar divergence |
//! | Poisson (Jacobi) | pressure |
//! | Pressure projection | velocity state |
//! | Composite | output color |
//!
//! The same math runs on the host in [`cpu`], which the tests use as a
//! reference without a GPU.

pub mod color;
pub mod config;
pub mod cpu;
pub mod driver;
pub mod error;
pub mod ether;
pub mod frame;
pub mod gpu;
pub mod grid;
pub mod palette;
pub mod pointer;
pub mod time;
pub mod window;

pub use color::Color;
pub use config::{BoundaryMode, EtherConfig};
pub use driver::AutoDriver;
pub use error::{ConfigError, EtherError, GpuError};
pub use ether::{LiquidEther, PaletteSender};
pub use frame::Frame;
pub use glam::{UVec2, Vec2};
pub use grid::GridLayout;
pub use palette::Palette;
pub use pointer::{ForceInput, Pointer};
pub use time::FrameClock;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use liquid_ether::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::Color;
    pub use crate::config::{BoundaryMode, EtherConfig};
    pub use crate::error::{ConfigError, EtherError, GpuError};
    pub use crate::ether::{LiquidEther, PaletteSender};
    pub use crate::frame::Frame;
    pub use crate::grid::GridLayout;
    pub use crate::palette::Palette;
    pub use crate::{UVec2, Vec2};
}
