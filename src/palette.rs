//! Palettes and their 1D lookup textures.
//!
//! A [`Palette`] is the ordered color set handed over by the color-extraction
//! side. The compositor samples it as a `width x 1` RGBA texture indexed by
//! local velocity magnitude, so slow regions pick the first stop and fast
//! regions the last.
//!
//! ```ignore
//! let palette = Palette::parse(&["#5227FF", "#FF9FFC", "#B19EEF"])?;
//! let texels = palette.lookup_texels();
//! assert_eq!(texels.width, 3);
//! ```

use crate::color::Color;
use crate::error::ConfigError;

/// Default stops, matching [`crate::EtherConfig::default`].
pub const DEFAULT_PALETTE: [&str; 3] = ["#5227FF", "#FF9FFC", "#B19EEF"];

/// Named palettes used by the demo host.
pub const PRESETS: &[(&str, &[&str])] = &[
    ("ether", &DEFAULT_PALETTE),
    ("sunset", &["#1a0033", "#800080", "#ff3366", "#ff8033", "#ffe666"]),
    ("ocean", &["#000d26", "#003366", "#006699", "#3399cc", "#99e6ff"]),
    ("neon", &["#ff0080", "#8000ff", "#0080ff", "#00ffff", "#80ff80"]),
    ("fire", &["#1a0000", "#800000", "#ff4d00", "#ffb300", "#ffffcc"]),
];

/// An ordered, non-empty sequence of colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build a palette. Fails with [`ConfigError::EmptyPalette`] for no colors.
    pub fn new(colors: Vec<Color>) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(Self { colors })
    }

    /// Parse color strings in order.
    pub fn parse<S: AsRef<str>>(colors: &[S]) -> Result<Self, ConfigError> {
        let parsed = colors
            .iter()
            .map(|c| Color::parse(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    /// Look up a preset from [`PRESETS`] by name.
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, stops)| Self::parse(stops).ok())
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Encode the lookup texture contents.
    ///
    /// Width equals the palette length, except that a single color is
    /// duplicated to width 2 so linear filtering has two texels to blend.
    /// Texels are always opaque.
    pub fn lookup_texels(&self) -> PaletteTexels {
        let stops: Vec<Color> = if self.colors.len() == 1 {
            vec![self.colors[0]; 2]
        } else {
            self.colors.clone()
        };

        let mut data = Vec::with_capacity(stops.len() * 4);
        for c in &stops {
            data.extend_from_slice(&c.opaque().to_array());
        }

        PaletteTexels {
            width: stops.len() as u32,
            data,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .filter_map(|c| Color::parse(c).ok())
                .collect(),
        }
    }
}

/// Raw RGBA8 contents of a `width x 1` palette lookup texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteTexels {
    /// Texture width in texels (height is always 1).
    pub width: u32,
    /// `width * 4` bytes.
    pub data: Vec<u8>,
}

impl PaletteTexels {
    /// Texel `i` as `[r, g, b, a]`.
    pub fn texel(&self, i: u32) -> [u8; 4] {
        let o = (i.min(self.width - 1) * 4) as usize;
        [self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3]]
    }

    /// Linear-filtered, clamp-to-edge sample at `u` in `[0, 1]`, in unit range.
    ///
    /// Matches what a `Linear`/`ClampToEdge` sampler returns for the texture.
    pub fn sample(&self, u: f32) -> [f32; 4] {
        let x = u * self.width as f32 - 0.5;
        let x0 = x.floor();
        let t = x - x0;
        let i0 = (x0 as i64).clamp(0, self.width as i64 - 1) as u32;
        let i1 = (x0 as i64 + 1).clamp(0, self.width as i64 - 1) as u32;
        let a = self.texel(i0);
        let b = self.texel(i1);

        let mut out = [0.0; 4];
        for c in 0..4 {
            let av = a[c] as f32 / 255.0;
            let bv = b[c] as f32 / 255.0;
            out[c] = av + (bv - av) * t;
        }
        out
    }
}
