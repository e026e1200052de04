//! Auto-driver: keeps the effect alive when nobody moves a pointer.
//!
//! The driver walks a `current` point toward a random `target` inside
//! `±(1 - margin)` and writes it into the [`Pointer`]. When the target is
//! reached (within [`TARGET_EPSILON`]) a new one is picked and that tick does
//! not move. Speed eases in with a smoothstep over the ramp duration after
//! every (re)activation.
//!
//! User input suspends the driver. It resumes from the pointer's current
//! position once the user has left and `auto_resume_delay` seconds have passed
//! since the last interaction.
//!
//! Positions stay inside `±(1 - margin)` with one exception: after a resume
//! the walk starts wherever the user left the pointer, possibly outside that
//! square, and only re-enters it on the way to its next target.

use std::time::Instant;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EtherConfig;
use crate::pointer::Pointer;

/// Distance under which the target counts as reached.
pub const TARGET_EPSILON: f32 = 0.01;
/// Wall-clock deltas above this (seconds) are treated as [`NOMINAL_DT`].
pub const MAX_DT: f32 = 0.2;
pub const NOMINAL_DT: f32 = 0.016;

/// Smoothstep ease-in factor after `elapsed` of `duration` seconds.
///
/// A zero duration means no ramp.
pub fn ramp_factor(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    let t = (elapsed / duration).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Synthesizes a wandering force position.
#[derive(Debug)]
pub struct AutoDriver {
    enabled: bool,
    speed: f32,
    margin: f32,
    ramp_duration: f32,
    resume_delay: f32,
    active: bool,
    current: Vec2,
    target: Vec2,
    last_time: Instant,
    activation_time: Instant,
    rng: StdRng,
}

impl AutoDriver {
    /// Create a driver seeded from system entropy.
    pub fn new(config: &EtherConfig, now: Instant) -> Self {
        Self::with_rng(config, now, StdRng::from_entropy())
    }

    /// Create a driver with an explicit random source.
    pub fn with_rng(config: &EtherConfig, now: Instant, rng: StdRng) -> Self {
        let mut driver = Self {
            enabled: config.auto_demo,
            speed: config.auto_speed,
            margin: config.auto_margin,
            ramp_duration: config.auto_ramp_duration,
            resume_delay: config.auto_resume_delay,
            active: true,
            current: Vec2::ZERO,
            target: Vec2::ZERO,
            last_time: now,
            activation_time: now,
            rng,
        };
        driver.pick_new_target();
        driver
    }

    /// Whether the driver currently owns the pointer.
    pub fn is_active(&self) -> bool {
        self.enabled && self.active
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    fn pick_new_target(&mut self) {
        let extent = 1.0 - self.margin;
        let mut axis = || (self.rng.gen::<f32>() * 2.0 - 1.0) * extent;
        let x = axis();
        let y = axis();
        self.target = Vec2::new(x, y);
    }

    fn stop(&mut self, pointer: &mut Pointer, now: Instant) {
        if self.active {
            log::debug!("auto-driver suspended by user input");
        }
        self.active = false;
        self.last_time = now;
        pointer.is_auto_active = false;
    }

    /// Advance one tick and write the new position into `pointer`.
    pub fn update(&mut self, pointer: &mut Pointer, now: Instant) {
        if !self.enabled {
            return;
        }

        if pointer.is_user_controlled() {
            self.stop(pointer, now);
            return;
        }
        if let Some(last) = pointer.last_user_interaction() {
            if now.duration_since(last).as_secs_f32() < self.resume_delay {
                self.stop(pointer, now);
                return;
            }
        }

        if !self.active {
            log::debug!("auto-driver resuming at {:?}", pointer.coords);
            self.active = true;
            self.current = pointer.coords;
            self.last_time = now;
            self.activation_time = now;
        }
        pointer.is_auto_active = true;

        let mut dt = now.duration_since(self.last_time).as_secs_f32();
        self.last_time = now;
        if dt > MAX_DT {
            dt = NOMINAL_DT;
        }

        let dir = self.target - self.current;
        let dist = dir.length();
        if dist < TARGET_EPSILON {
            self.pick_new_target();
            return;
        }

        let ramp = ramp_factor(
            now.duration_since(self.activation_time).as_secs_f32(),
            self.ramp_duration,
        );
        let step = self.speed * dt * ramp;
        self.current += dir / dist * step.min(dist);
        pointer.set_normalized(self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn driver(config: &EtherConfig, now: Instant) -> AutoDriver {
        AutoDriver::with_rng(config, now, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_ramp_monotonic() {
        let mut prev = 0.0;
        for i in 0..=60 {
            let r = ramp_factor(i as f32 * 0.01, 0.6);
            assert!(r >= prev, "ramp must not decrease");
            prev = r;
        }
        assert_eq!(ramp_factor(0.0, 0.6), 0.0);
        assert_eq!(ramp_factor(0.6, 0.6), 1.0);
        assert_eq!(ramp_factor(5.0, 0.6), 1.0);
        assert_eq!(ramp_factor(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_targets_within_margin() {
        let config = EtherConfig::default();
        let mut d = driver(&config, Instant::now());
        for _ in 0..1000 {
            d.pick_new_target();
            assert!(d.target.x.abs() <= 0.8 && d.target.y.abs() <= 0.8);
        }
    }

    #[test]
    fn test_repick_without_movement() {
        let config = EtherConfig::default();
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(config.auto_intensity, config.takeover_duration);

        d.target = d.current + Vec2::new(0.005, 0.0);
        let before = d.current;
        let old_target = d.target;
        d.update(&mut pointer, start + Duration::from_millis(16));

        assert_eq!(d.current, before);
        assert_ne!(d.target, old_target);
        assert_eq!(pointer.coords, Vec2::ZERO);
    }

    #[test]
    fn test_step_clamped_to_distance() {
        let mut config = EtherConfig::default();
        config.auto_speed = 100.0;
        config.auto_ramp_duration = 0.0;
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(config.auto_intensity, config.takeover_duration);

        d.target = Vec2::new(0.5, 0.0);
        d.update(&mut pointer, start + Duration::from_millis(100));
        assert_eq!(d.current, Vec2::new(0.5, 0.0));
        assert_eq!(pointer.coords, d.current);
        assert!(pointer.is_auto_active);
    }

    #[test]
    fn test_large_gap_uses_nominal_dt() {
        let mut config = EtherConfig::default();
        config.auto_speed = 1.0;
        config.auto_ramp_duration = 0.0;
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(1.0, 0.0);

        d.target = Vec2::new(0.8, 0.0);
        d.update(&mut pointer, start + Duration::from_secs(3));
        assert!((d.current.x - NOMINAL_DT).abs() < 1e-6);
    }

    #[test]
    fn test_user_suspends_and_resume_after_delay() {
        let config = EtherConfig::default();
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(config.auto_intensity, config.takeover_duration);

        d.update(&mut pointer, start + Duration::from_millis(16));
        assert!(pointer.is_auto_active);

        let touch = start + Duration::from_millis(32);
        pointer.user_moved(Vec2::new(0.4, 0.4), touch);
        d.update(&mut pointer, touch);
        assert!(!d.is_active());

        pointer.user_left();
        d.update(&mut pointer, touch + Duration::from_millis(500));
        assert!(!d.is_active(), "still inside the resume delay");

        pointer.update(touch + Duration::from_secs(1));
        d.update(&mut pointer, touch + Duration::from_millis(1100));
        assert!(d.is_active());
        assert!(pointer.is_auto_active);
        // Resumes from where the user left the pointer (first tick has ramp 0).
        assert_eq!(d.current(), Vec2::new(0.4, 0.4));
    }

    #[test]
    fn test_disabled_never_moves() {
        let config = EtherConfig::default().with_auto_demo(false);
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(1.0, 0.0);
        d.update(&mut pointer, start + Duration::from_millis(100));
        assert!(!d.is_active());
        assert_eq!(pointer.coords, Vec2::ZERO);
    }

    #[test]
    fn test_walk_stays_within_margin() {
        let config = EtherConfig::default();
        let extent = 1.0 - config.auto_margin;
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(config.auto_intensity, config.takeover_duration);

        let mut now = start;
        for _ in 0..10_000 {
            now += Duration::from_millis(16);
            d.update(&mut pointer, now);
            assert!(d.current.x.abs() <= extent + 1e-5, "x {}", d.current.x);
            assert!(d.current.y.abs() <= extent + 1e-5, "y {}", d.current.y);
        }
    }

    #[test]
    fn test_step_reaches_full_speed_after_ramp() {
        let config = EtherConfig::default();
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(config.auto_intensity, config.takeover_duration);
        d.target = Vec2::new(0.8, 0.0);

        let full_step = config.auto_speed * 0.016;
        let mut now = start;
        for i in 1..=50u32 {
            now += Duration::from_millis(16);
            let before = d.current;
            d.update(&mut pointer, now);
            let moved = (d.current - before).length();

            if i * 16 < 600 {
                assert!(moved < full_step, "tick {} moved {}", i, moved);
            } else {
                assert!((moved - full_step).abs() < 1e-5, "tick {} moved {}", i, moved);
            }
        }
    }

    #[test]
    fn test_resume_outside_margin_heads_back_in() {
        let config = EtherConfig::default();
        let extent = 1.0 - config.auto_margin;
        let start = Instant::now();
        let mut d = driver(&config, start);
        let mut pointer = Pointer::new(config.auto_intensity, 0.0);

        pointer.user_moved(Vec2::new(0.99, 0.99), start);
        d.update(&mut pointer, start);
        pointer.user_left();

        let mut now = start + Duration::from_secs(2);
        d.update(&mut pointer, now);
        assert_eq!(d.current(), Vec2::new(0.99, 0.99));

        let mut prev = d.current().abs().max_element();
        for _ in 0..30 {
            now += Duration::from_millis(16);
            d.update(&mut pointer, now);
            let reach = d.current().abs().max_element();
            assert!(reach <= prev + 1e-6);
            prev = reach;
        }
        assert!(prev > extent, "still on its way back in");
    }
}
