//! Configuration for a LiquidEther instance.
//!
//! Defaults reproduce the look of the catalog feed background. Configurations
//! can be built fluently or loaded from JSON:
//!
//! ```ignore
//! let config = EtherConfig::default()
//!     .with_palette(["#5227FF", "#FF9FFC", "#B19EEF"])
//!     .with_resolution(0.5)
//!     .with_viscosity(Some(30.0));
//!
//! let from_file = EtherConfig::load("ether.json")?;
//! ```
//!
//! ```json
//! { "palette": ["#ff0000", "#00ff00"], "mouse_force": 12.0, "boundary_mode": "bounce" }
//! ```
//!
//! Every value is checked by [`EtherConfig::validate`]. Out-of-range values are
//! rejected with a [`ConfigError`]; nothing is clamped behind the caller's back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{ConfigError, EtherError};
use crate::palette::{Palette, DEFAULT_PALETTE};

/// Edge behaviour of the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Passes cover the whole grid; edge texels evolve like the interior.
    #[default]
    Open,
    /// Passes skip the outermost ring of texels, which stays at rest and acts
    /// as a solid, non-penetrating wall.
    Bounce,
}

/// All options accepted when creating a [`crate::LiquidEther`].
///
/// Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtherConfig {
    /// Ordered palette color strings. See [`crate::color`] for accepted forms.
    pub palette: Vec<String>,
    /// Color shown where the fluid is at rest.
    pub background: String,
    /// Scale applied to the pointer delta before it is splatted.
    pub mouse_force: f32,
    /// Radius of the force splat, in grid cells.
    pub cursor_size: f32,
    /// Run the viscous diffusion stage.
    pub is_viscous: bool,
    /// Viscosity coefficient for the diffusion stage.
    pub viscosity: f32,
    /// Jacobi iterations for the diffusion stage.
    pub viscous_iterations: u32,
    /// Jacobi iterations for the pressure solve.
    pub poisson_iterations: u32,
    /// Grid size as a fraction of the container size, in `(0, 1]`.
    pub resolution: f32,
    pub boundary_mode: BoundaryMode,
    /// Let the auto-driver move the force center when nobody else does.
    pub auto_demo: bool,
    /// Auto-driver speed in normalized units per second.
    pub auto_speed: f32,
    /// Multiplier applied to auto-driven pointer deltas.
    pub auto_intensity: f32,
    /// Inset of auto-driver targets from the edge of `[-1, 1]²`.
    pub auto_margin: f32,
    /// Blend time from the auto position to the user's pointer.
    pub takeover_duration: f32,
    /// Idle time after user input before the auto-driver resumes.
    pub auto_resume_delay: f32,
    /// Ease-in time of the auto-driver after (re)activation.
    pub auto_ramp_duration: f32,
    /// Simulation timestep `dt`.
    pub timestep: f32,
    /// Use back-and-forth error correction in the advection stage.
    pub bfecc: bool,
}

impl Default for EtherConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            background: "#00000000".to_string(),
            mouse_force: 20.0,
            cursor_size: 100.0,
            is_viscous: false,
            viscosity: 80.0,
            viscous_iterations: 32,
            poisson_iterations: 32,
            resolution: 0.5,
            boundary_mode: BoundaryMode::Open,
            auto_demo: true,
            auto_speed: 0.5,
            auto_intensity: 2.2,
            auto_margin: 0.2,
            takeover_duration: 0.25,
            auto_resume_delay: 1.0,
            auto_ramp_duration: 0.6,
            timestep: 0.014,
            bfecc: true,
        }
    }
}

impl EtherConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EtherError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EtherError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Set the palette color strings.
    pub fn with_palette<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.palette = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the background color string.
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = color.into();
        self
    }

    /// Set force magnitude and splat radius (in cells).
    pub fn with_force(mut self, mouse_force: f32, cursor_size: f32) -> Self {
        self.mouse_force = mouse_force;
        self.cursor_size = cursor_size;
        self
    }

    /// Enable viscous diffusion with the given coefficient, or disable it with `None`.
    pub fn with_viscosity(mut self, viscosity: Option<f32>) -> Self {
        match viscosity {
            Some(v) => {
                self.is_viscous = true;
                self.viscosity = v;
            }
            None => self.is_viscous = false,
        }
        self
    }

    /// Set the Jacobi iteration counts for the viscous and pressure stages.
    pub fn with_iterations(mut self, viscous: u32, poisson: u32) -> Self {
        self.viscous_iterations = viscous;
        self.poisson_iterations = poisson;
        self
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_boundary_mode(mut self, mode: BoundaryMode) -> Self {
        self.boundary_mode = mode;
        self
    }

    /// Enable or disable the auto-driver.
    pub fn with_auto_demo(mut self, enabled: bool) -> Self {
        self.auto_demo = enabled;
        self
    }

    pub fn with_timestep(mut self, dt: f32) -> Self {
        self.timestep = dt;
        self
    }

    pub fn with_bfecc(mut self, enabled: bool) -> Self {
        self.bfecc = enabled;
        self
    }

    /// Check every option. The first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestep == 0.0 {
            return Err(ConfigError::ZeroTimestep);
        }
        if !self.timestep.is_finite() || self.timestep < 0.0 {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 || self.resolution > 1.0 {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }

        self.parsed_palette()?;
        self.parsed_background()?;

        let non_negative = [
            ("mouse_force", self.mouse_force),
            ("cursor_size", self.cursor_size),
            ("viscosity", self.viscosity),
            ("auto_speed", self.auto_speed),
            ("auto_intensity", self.auto_intensity),
            ("takeover_duration", self.takeover_duration),
            ("auto_resume_delay", self.auto_resume_delay),
            ("auto_ramp_duration", self.auto_ramp_duration),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }

        if !self.auto_margin.is_finite() || !(0.0..1.0).contains(&self.auto_margin) {
            return Err(ConfigError::InvalidMargin(self.auto_margin));
        }
        if self.poisson_iterations == 0 {
            return Err(ConfigError::ZeroIterations("poisson"));
        }
        if self.is_viscous && self.viscous_iterations == 0 {
            return Err(ConfigError::ZeroIterations("viscous"));
        }

        Ok(())
    }

    /// The palette strings parsed into a [`Palette`].
    pub fn parsed_palette(&self) -> Result<Palette, ConfigError> {
        Palette::parse(&self.palette)
    }

    /// The background string parsed into a [`Color`].
    pub fn parsed_background(&self) -> Result<Color, ConfigError> {
        Color::parse(&self.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EtherConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timestep_rejected() {
        let config = EtherConfig::default().with_timestep(0.0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimestep));
    }

    #[test]
    fn test_negative_timestep_rejected() {
        let config = EtherConfig::default().with_timestep(-0.01);
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimestep(-0.01)));
    }

    #[test]
    fn test_resolution_bounds() {
        for bad in [0.0, -0.5, 1.5, f32::NAN] {
            let config = EtherConfig::default().with_resolution(bad);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidResolution(_))),
                "resolution {} should be rejected",
                bad
            );
        }
        assert!(EtherConfig::default().with_resolution(1.0).validate().is_ok());
    }

    #[test]
    fn test_empty_palette_rejected() {
        let config = EtherConfig::default().with_palette(Vec::<String>::new());
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));
    }

    #[test]
    fn test_bad_background_rejected() {
        let config = EtherConfig::default().with_background("transparent-ish");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidColor(_))));
    }

    #[test]
    fn test_negative_force_rejected() {
        let config = EtherConfig::default().with_force(-1.0, 10.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "mouse_force", value: -1.0 })
        );
    }

    #[test]
    fn test_iterations() {
        let config = EtherConfig::default().with_iterations(0, 0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroIterations("poisson")));

        // Viscous iterations only matter while the stage runs.
        let config = EtherConfig::default().with_iterations(0, 8);
        assert!(config.validate().is_ok());
        let config = config.with_viscosity(Some(5.0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroIterations("viscous")));
    }

    #[test]
    fn test_margin_range() {
        let mut config = EtherConfig::default();
        config.auto_margin = 1.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMargin(1.0)));
        config.auto_margin = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = EtherConfig::from_json_str(
            r##"{ "palette": ["#ff0000"], "boundary_mode": "bounce", "timestep": 0.01 }"##,
        )
        .unwrap();
        assert_eq!(config.palette, vec!["#ff0000".to_string()]);
        assert_eq!(config.boundary_mode, BoundaryMode::Bounce);
        assert_eq!(config.timestep, 0.01);
        assert_eq!(config.poisson_iterations, 32);
    }

    #[test]
    fn test_json_unknown_field_rejected() {
        let err = EtherConfig::from_json_str(r#"{ "isBounce": true }"#).unwrap_err();
        assert!(matches!(err, EtherError::Json(_)));
    }

    #[test]
    fn test_json_invalid_values_rejected() {
        let err = EtherConfig::from_json_str(r#"{ "timestep": 0.0 }"#).unwrap_err();
        assert!(matches!(err, EtherError::Config(ConfigError::ZeroTimestep)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EtherConfig::default().with_boundary_mode(BoundaryMode::Bounce);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EtherConfig::from_json_str(&json).unwrap(), config);
    }
}
