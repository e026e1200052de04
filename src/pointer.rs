//! Force position state.
//!
//! The pointer holds a normalized position in `[-1, 1]²` (+y up) and its
//! previous-frame value; the per-frame delta is what drives the external force
//! stage. Positions come either from the [`crate::driver::AutoDriver`] or from a
//! real pointer. When the user grabs control while the driver is active, the
//! position blends from the auto position to the user's over
//! `takeover_duration` so the splat does not jump across the grid.

use std::time::Instant;

use glam::Vec2;

/// Uniform inputs of the external force stage for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceInput {
    /// Impulse added at the splat center.
    pub force: Vec2,
    /// Splat center in clip space, kept off the boundary cells.
    pub center: Vec2,
    /// Splat radius in cells.
    pub scale: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Takeover {
    from: Vec2,
    to: Vec2,
    start: Instant,
}

/// Current and previous force position plus the frame delta.
#[derive(Debug, Clone)]
pub struct Pointer {
    pub coords: Vec2,
    pub coords_old: Vec2,
    pub diff: Vec2,
    /// Set while the auto-driver owns the position.
    pub is_auto_active: bool,
    auto_intensity: f32,
    takeover_duration: f32,
    takeover: Option<Takeover>,
    user_control: bool,
    last_user_interaction: Option<Instant>,
}

impl Pointer {
    /// A pointer at rest at the origin.
    pub fn new(auto_intensity: f32, takeover_duration: f32) -> Self {
        Self {
            coords: Vec2::ZERO,
            coords_old: Vec2::ZERO,
            diff: Vec2::ZERO,
            is_auto_active: false,
            auto_intensity,
            takeover_duration,
            takeover: None,
            user_control: false,
            last_user_interaction: None,
        }
    }

    /// Move to `pos` without any takeover handling. Used by the auto-driver.
    pub fn set_normalized(&mut self, pos: Vec2) {
        self.coords = pos;
    }

    /// A real pointer moved to `pos` (normalized, +y up).
    pub fn user_moved(&mut self, pos: Vec2, now: Instant) {
        self.last_user_interaction = Some(now);

        if let Some(takeover) = &mut self.takeover {
            takeover.to = pos;
            return;
        }

        if self.is_auto_active && !self.user_control && self.takeover_duration > 0.0 {
            self.takeover = Some(Takeover {
                from: self.coords,
                to: pos,
                start: now,
            });
        } else {
            self.coords = pos;
        }
        self.is_auto_active = false;
        self.user_control = true;
    }

    /// The real pointer left the container.
    pub fn user_left(&mut self) {
        self.user_control = false;
    }

    /// Whether a real pointer currently owns the position.
    pub fn is_user_controlled(&self) -> bool {
        self.user_control
    }

    pub fn last_user_interaction(&self) -> Option<Instant> {
        self.last_user_interaction
    }

    pub fn is_taking_over(&self) -> bool {
        self.takeover.is_some()
    }

    /// Advance one frame: resolve any takeover blend, then recompute `diff`.
    ///
    /// `diff` is zero while the position sits exactly at the origin, and is
    /// scaled by the auto intensity only while the auto-driver is in control.
    pub fn update(&mut self, now: Instant) {
        if let Some(takeover) = self.takeover {
            let t = now.duration_since(takeover.start).as_secs_f32() / self.takeover_duration;
            if t >= 1.0 {
                self.takeover = None;
                self.coords = takeover.to;
            } else {
                let k = t * t * (3.0 - 2.0 * t);
                self.coords = takeover.from.lerp(takeover.to, k);
            }
        }

        self.diff = self.coords - self.coords_old;
        self.coords_old = self.coords;
        if self.coords_old == Vec2::ZERO {
            self.diff = Vec2::ZERO;
        }
        if self.is_auto_active && self.takeover.is_none() {
            self.diff *= self.auto_intensity;
        }
    }

    /// Force stage inputs for the current frame.
    ///
    /// The center is clamped to `[-1 + r + 2px, 1 - r - 2px]` per axis where
    /// `r = cursor_size * px`. If the splat is wider than the grid the upper
    /// bound wins.
    pub fn force_input(&self, mouse_force: f32, cursor_size: f32, cell_scale: Vec2) -> ForceInput {
        let radius = cursor_size * cell_scale;
        let lo = -Vec2::ONE + radius + cell_scale * 2.0;
        let hi = Vec2::ONE - radius - cell_scale * 2.0;
        ForceInput {
            force: self.diff / 2.0 * mouse_force,
            center: self.coords.max(lo).min(hi),
            scale: Vec2::splat(cursor_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_at_rest() {
        let mut pointer = Pointer::new(2.0, 0.25);
        pointer.update(Instant::now());
        assert_eq!(pointer.coords, Vec2::ZERO);
        assert_eq!(pointer.diff, Vec2::ZERO);
    }

    #[test]
    fn test_diff_and_intensity() {
        let now = Instant::now();
        let mut pointer = Pointer::new(2.0, 0.25);
        pointer.set_normalized(Vec2::new(0.1, 0.0));
        pointer.update(now);
        assert_eq!(pointer.diff, Vec2::new(0.1, 0.0));

        pointer.is_auto_active = true;
        pointer.set_normalized(Vec2::new(0.2, 0.0));
        pointer.update(now);
        assert!((pointer.diff.x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_origin_zeroes_diff() {
        let now = Instant::now();
        let mut pointer = Pointer::new(1.0, 0.0);
        pointer.set_normalized(Vec2::new(0.5, 0.5));
        pointer.update(now);
        pointer.set_normalized(Vec2::ZERO);
        pointer.update(now);
        assert_eq!(pointer.diff, Vec2::ZERO);
    }

    #[test]
    fn test_takeover_blends_to_user() {
        let start = Instant::now();
        let mut pointer = Pointer::new(1.0, 1.0);
        pointer.is_auto_active = true;
        pointer.set_normalized(Vec2::new(-0.5, 0.0));

        pointer.user_moved(Vec2::new(0.5, 0.0), start);
        assert!(pointer.is_taking_over());
        assert!(pointer.is_user_controlled());
        assert!(!pointer.is_auto_active);

        pointer.update(start + Duration::from_millis(500));
        assert!(pointer.coords.x.abs() < 1e-4, "halfway point is the midpoint");

        pointer.update(start + Duration::from_millis(1500));
        assert!(!pointer.is_taking_over());
        assert_eq!(pointer.coords, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_no_takeover_without_auto() {
        let mut pointer = Pointer::new(1.0, 1.0);
        pointer.user_moved(Vec2::new(0.3, 0.3), Instant::now());
        assert!(!pointer.is_taking_over());
        assert_eq!(pointer.coords, Vec2::new(0.3, 0.3));

        pointer.user_left();
        assert!(!pointer.is_user_controlled());
    }

    #[test]
    fn test_force_input_clamps_center() {
        let mut pointer = Pointer::new(1.0, 0.0);
        pointer.set_normalized(Vec2::new(1.0, -1.0));
        pointer.update(Instant::now());

        let px = Vec2::new(0.01, 0.02);
        let input = pointer.force_input(20.0, 10.0, px);
        assert!((input.center.x - (1.0 - 0.1 - 0.02)).abs() < 1e-6);
        assert!((input.center.y - (-1.0 + 0.2 + 0.04)).abs() < 1e-6);
        assert_eq!(input.scale, Vec2::splat(10.0));
        assert!((input.force.x - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_force_input_oversized_splat() {
        let pointer = Pointer::new(1.0, 0.0);
        let px = Vec2::splat(0.01);
        let input = pointer.force_input(1.0, 200.0, px);
        // lo > hi: the upper bound wins, no panic.
        assert!((input.center.x - (1.0 - 2.0 - 0.02)).abs() < 1e-6);
    }
}
