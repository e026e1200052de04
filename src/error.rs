//! Error types for LiquidEther.
//!
//! Every failure in this crate is immediate and terminal for the operation that
//! raised it. Nothing retries; the caller decides whether to reinitialize.

use std::fmt;

/// Errors that can occur while acquiring or using the GPU.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for the window.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// A render target could not be allocated (out of memory, lost context, bad size).
    Allocation(String),
    /// The surface failed in a way that cannot be recovered by reconfiguring.
    Surface(wgpu::SurfaceError),
    /// The surface reports no usable texture format.
    UnsupportedSurface,
    /// Failed to map buffer for reading.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::Allocation(msg) => write!(f, "Failed to allocate render target: {}", msg),
            GpuError::Surface(e) => write!(f, "Surface error: {}", e),
            GpuError::UnsupportedSurface => write!(f, "Surface reports no supported texture formats"),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::Surface(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Rejected configuration values.
///
/// Invalid input is reported with a descriptive error and never silently
/// adjusted into range.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `timestep` is zero; the divergence stage divides by it.
    ZeroTimestep,
    /// `timestep` is negative or not finite.
    InvalidTimestep(f32),
    /// `resolution` is outside `(0, 1]` or not finite.
    InvalidResolution(f32),
    /// The palette has no colors.
    EmptyPalette,
    /// A color string could not be parsed.
    InvalidColor(String),
    /// A numeric option is negative or not finite.
    InvalidValue {
        /// Option name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// `auto_margin` is outside `[0, 1)`.
    InvalidMargin(f32),
    /// A Jacobi stage that runs has zero iterations.
    ZeroIterations(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTimestep => write!(f, "timestep must be non-zero (divergence divides by dt)"),
            ConfigError::InvalidTimestep(v) => write!(f, "timestep must be a positive finite number, got {}", v),
            ConfigError::InvalidResolution(v) => write!(f, "resolution must be in (0, 1], got {}", v),
            ConfigError::EmptyPalette => write!(f, "palette must contain at least one color"),
            ConfigError::InvalidColor(s) => write!(f, "invalid color '{}'", s),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "{} must be a non-negative finite number, got {}", field, value)
            }
            ConfigError::InvalidMargin(v) => write!(f, "auto_margin must be in [0, 1), got {}", v),
            ConfigError::ZeroIterations(stage) => write!(f, "{} iterations must be at least 1", stage),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by the LiquidEther manager and its windowed host.
#[derive(Debug)]
pub enum EtherError {
    /// Invalid configuration.
    Config(ConfigError),
    /// GPU initialization, allocation or presentation failed.
    Gpu(GpuError),
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// Failed to read a configuration file or write an export.
    Io(std::io::Error),
    /// Configuration file is not valid JSON for [`crate::EtherConfig`].
    Json(serde_json::Error),
    /// Failed to encode an exported frame.
    Image(image::ImageError),
    /// Frame readback requested from a target that does not support it.
    ReadbackUnsupported,
    /// The instance has been disposed.
    Disposed,
}

impl fmt::Display for EtherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherError::Config(e) => write!(f, "Invalid configuration: {}", e),
            EtherError::Gpu(e) => write!(f, "GPU error: {}", e),
            EtherError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            EtherError::Window(e) => write!(f, "Failed to create window: {}", e),
            EtherError::Io(e) => write!(f, "I/O error: {}", e),
            EtherError::Json(e) => write!(f, "Failed to parse configuration: {}", e),
            EtherError::Image(e) => write!(f, "Failed to encode image: {}", e),
            EtherError::ReadbackUnsupported => {
                write!(f, "Frame readback is only available for headless instances")
            }
            EtherError::Disposed => write!(f, "LiquidEther instance has been disposed"),
        }
    }
}

impl std::error::Error for EtherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtherError::Config(e) => Some(e),
            EtherError::Gpu(e) => Some(e),
            EtherError::EventLoop(e) => Some(e),
            EtherError::Window(e) => Some(e),
            EtherError::Io(e) => Some(e),
            EtherError::Json(e) => Some(e),
            EtherError::Image(e) => Some(e),
            EtherError::ReadbackUnsupported | EtherError::Disposed => None,
        }
    }
}

impl From<ConfigError> for EtherError {
    fn from(e: ConfigError) -> Self {
        EtherError::Config(e)
    }
}

impl From<GpuError> for EtherError {
    fn from(e: GpuError) -> Self {
        EtherError::Gpu(e)
    }
}

impl From<wgpu::CreateSurfaceError> for EtherError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        EtherError::Gpu(GpuError::SurfaceCreation(e))
    }
}

impl From<winit::error::EventLoopError> for EtherError {
    fn from(e: winit::error::EventLoopError) -> Self {
        EtherError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for EtherError {
    fn from(e: winit::error::OsError) -> Self {
        EtherError::Window(e)
    }
}

impl From<std::io::Error> for EtherError {
    fn from(e: std::io::Error) -> Self {
        EtherError::Io(e)
    }
}

impl From<serde_json::Error> for EtherError {
    fn from(e: serde_json::Error) -> Self {
        EtherError::Json(e)
    }
}

impl From<image::ImageError> for EtherError {
    fn from(e: image::ImageError) -> Self {
        EtherError::Image(e)
    }
}
