//! Fixed-rate simulation timer.
//!
//! Real time is converted into whole simulation ticks at a configurable rate.
//! The fractional remainder is the interpolation alpha for rendering between
//! the last two simulation states.

use std::time::{Duration, Instant};

use tracing::warn;

/// Longest wall-clock gap a single frame may account for.
pub const MAX_FRAME_TIME: Duration = Duration::from_secs(1);

/// Default cap on ticks run in a single frame.
pub const MAX_TICKS_PER_FRAME: u32 = 100;

/// Converts elapsed wall-clock time into simulation ticks.
///
/// Call [`advance`](Self::advance) once per frame, run the returned number of
/// ticks, then render with [`alpha`](Self::alpha).
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    ticks_per_second: f64,
    max_ticks_per_frame: u32,
    time_scale: f64,
    previous_time: Instant,
    /// Ticks owed, including the fractional part.
    pending: f64,
    fps: f64,
    frame_count: u64,
    tick_count: u64,
}

impl FixedTimestep {
    pub fn new(ticks_per_second: f64) -> Self {
        Self {
            ticks_per_second,
            max_ticks_per_frame: MAX_TICKS_PER_FRAME,
            time_scale: 1.0,
            previous_time: Instant::now(),
            pending: 0.0,
            fps: 0.0,
            frame_count: 0,
            tick_count: 0,
        }
    }

    pub fn with_max_ticks_per_frame(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max;
        self
    }

    /// Measures the time since the previous call and returns the ticks to run.
    pub fn advance(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.previous_time);
        self.previous_time = now;
        self.advance_by(elapsed)
    }

    /// Accounts for `elapsed` wall-clock time and returns the ticks to run.
    ///
    /// `elapsed` is clamped to [`MAX_FRAME_TIME`]. At most the configured
    /// number of ticks is returned; any excess stays pending for later frames.
    pub fn advance_by(&mut self, elapsed: Duration) -> u32 {
        let elapsed = if elapsed > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                elapsed.as_secs_f64() * 1000.0,
                MAX_FRAME_TIME.as_secs_f64() * 1000.0
            );
            MAX_FRAME_TIME
        } else {
            elapsed
        };

        self.fps = if elapsed.is_zero() {
            0.0
        } else {
            1.0 / elapsed.as_secs_f64()
        };

        self.pending += elapsed.as_secs_f64() * self.time_scale * self.ticks_per_second;
        let ticks = (self.pending.floor() as u32).min(self.max_ticks_per_frame);
        self.pending -= ticks as f64;

        self.frame_count += 1;
        self.tick_count += ticks as u64;
        ticks
    }

    /// Progress towards the next tick, in `[0, 1]`.
    pub fn alpha(&self) -> f64 {
        self.pending.clamp(0.0, 1.0)
    }

    /// Frames per second measured over the last frame.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Duration of one tick at scale 1.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.ticks_per_second)
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
