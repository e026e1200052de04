//! Rendered frames read back from a headless instance.

use std::path::Path;

use crate::error::EtherError;

/// An RGBA8 image, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Pixel at `(x, y)`, `y` counted from the top.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let o = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    /// Iterate over every pixel as `[r, g, b, a]`.
    pub fn iter_pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.pixels
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Encode as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), EtherError> {
        image::save_buffer_with_format(
            path.as_ref(),
            &self.pixels,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        log::info!("saved {}x{} frame to {}", self.width, self.height, path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_indexing() {
        let frame = Frame {
            width: 2,
            height: 2,
            pixels: (0..16).collect(),
        };
        assert_eq!(frame.pixel(0, 0), [0, 1, 2, 3]);
        assert_eq!(frame.pixel(1, 1), [12, 13, 14, 15]);
        assert_eq!(frame.iter_pixels().count(), 4);
    }

    #[test]
    fn test_save_png() {
        let frame = Frame {
            width: 3,
            height: 1,
            pixels: vec![255, 0, 0, 255, 0, 255, 0, 128, 0, 0, 255, 0],
        };
        let path = std::env::temp_dir().join("liquid_ether_frame_test.png");
        frame.save_png(&path).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0, 128]);
        let _ = std::fs::remove_file(&path);
    }
}
