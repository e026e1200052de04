//! Field grid geometry.
//!
//! Every simulation field shares one [`GridLayout`]: the texel size derived
//! from the container size and the configured resolution, and the matching
//! cell scale (`1 / size`) that the stencils step by.

use glam::{UVec2, Vec2};

use crate::config::BoundaryMode;

/// Size of the simulation grid and the size of one cell in UV units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Texel dimensions of every field.
    pub fbo_size: UVec2,
    /// `(1 / width, 1 / height)`.
    pub cell_scale: Vec2,
}

impl GridLayout {
    /// Derive the grid for a container of `container` pixels.
    ///
    /// Each dimension is `max(1, round(resolution * container))`; a zero-sized
    /// container is treated as one pixel.
    pub fn new(resolution: f32, container: UVec2) -> Self {
        let container = container.max(UVec2::ONE);
        let scaled = |c: u32| ((c as f32 * resolution).round() as u32).max(1);
        let fbo_size = UVec2::new(scaled(container.x), scaled(container.y));
        Self {
            fbo_size,
            cell_scale: Vec2::ONE / fbo_size.as_vec2(),
        }
    }

    pub fn width(&self) -> u32 {
        self.fbo_size.x
    }

    pub fn height(&self) -> u32 {
        self.fbo_size.y
    }

    /// Inset applied to every pass in a step.
    pub fn boundary_space(&self, mode: BoundaryMode) -> Vec2 {
        match mode {
            BoundaryMode::Open => Vec2::ZERO,
            BoundaryMode::Bounce => self.cell_scale,
        }
    }
}

/// Buffer selection for a Jacobi loop over a pair of fields.
///
/// Iteration `i` reads buffer `i % 2` and writes buffer `(i + 1) % 2`, so the
/// first iteration always reads the buffer primed before the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong {
    pub read: usize,
    pub write: usize,
}

impl PingPong {
    pub fn for_iteration(i: u32) -> Self {
        let read = (i % 2) as usize;
        Self {
            read,
            write: 1 - read,
        }
    }

    /// Buffer holding the result after `iterations` passes.
    ///
    /// Zero iterations leave the primed buffer (index 0) untouched.
    pub fn last(iterations: u32) -> usize {
        (iterations % 2) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_resolution() {
        let layout = GridLayout::new(0.5, UVec2::new(800, 600));
        assert_eq!(layout.fbo_size, UVec2::new(400, 300));
        assert_eq!(layout.cell_scale, Vec2::new(1.0 / 400.0, 1.0 / 300.0));
    }

    #[test]
    fn test_rounding_and_minimum() {
        let layout = GridLayout::new(0.5, UVec2::new(801, 3));
        // 400.5 rounds away from zero, 1.5 likewise.
        assert_eq!(layout.fbo_size, UVec2::new(401, 2));

        let tiny = GridLayout::new(0.1, UVec2::new(0, 4));
        assert_eq!(tiny.fbo_size, UVec2::new(1, 1));
        assert_eq!(tiny.cell_scale, Vec2::ONE);
    }

    #[test]
    fn test_resize_round_trip() {
        let a = GridLayout::new(0.5, UVec2::new(1280, 720));
        let b = GridLayout::new(0.5, UVec2::new(640, 480));
        let c = GridLayout::new(0.5, UVec2::new(1280, 720));
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_boundary_space() {
        let layout = GridLayout::new(1.0, UVec2::new(100, 50));
        assert_eq!(layout.boundary_space(BoundaryMode::Open), Vec2::ZERO);
        assert_eq!(
            layout.boundary_space(BoundaryMode::Bounce),
            Vec2::new(0.01, 0.02)
        );
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(PingPong::for_iteration(0), PingPong { read: 0, write: 1 });
        assert_eq!(PingPong::for_iteration(1), PingPong { read: 1, write: 0 });
        assert_eq!(PingPong::for_iteration(6), PingPong { read: 0, write: 1 });

        assert_eq!(PingPong::last(0), 0);
        assert_eq!(PingPong::last(1), 1);
        assert_eq!(PingPong::last(32), 0);
        for n in 1..10 {
            assert_eq!(PingPong::last(n), PingPong::for_iteration(n - 1).write);
        }
    }
}
