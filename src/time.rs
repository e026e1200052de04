//! Frame clock for the render loop.
//!
//! Tracks wall-clock delta, elapsed time, frame count and FPS. Pausing freezes
//! the clock so that a resumed loop sees a normal delta instead of the whole
//! paused interval.
//!
//! ```ignore
//! let mut time = FrameClock::new();
//! loop {
//!     let dt = time.tick();
//!     log::trace!("frame {} dt {:.4}s fps {:.1}", time.frame(), dt, time.fps());
//! }
//! ```

use std::time::{Duration, Instant};

const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Wall-clock bookkeeping for rendered frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    /// Set while paused, holding the pause instant.
    paused_at: Option<Instant>,
    /// Total time spent paused.
    pause_elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// A clock whose first frame is measured from `now`.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            paused_at: None,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Record a frame at the current instant. Returns the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Record a frame at `now`. Returns the delta in seconds; zero while paused.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        if self.paused_at.is_some() {
            self.delta_secs = 0.0;
            return 0.0;
        }

        self.delta_secs = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.elapsed_secs = (now.saturating_duration_since(self.start))
            .saturating_sub(self.pause_elapsed)
            .as_secs_f32();
        self.frame_count += 1;

        let window = now.saturating_duration_since(self.fps_update_time);
        if window >= FPS_WINDOW {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / window.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    pub fn pause_at(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Resume after a pause; the paused interval is excluded from delta and elapsed.
    pub fn resume_at(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            let paused_for = now.saturating_duration_since(at);
            self.pause_elapsed += paused_for;
            self.last_frame += paused_for;
            self.fps_update_time = now;
            self.fps_frame_count = self.frame_count;
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Seconds of unpaused time up to the last frame.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames recorded so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
