//! Time management utilities

use std::time::Instant;

/// Frame timer anchored at engine initialization
///
/// `update` is called once per processed frame; the elapsed-time queries
/// read the clock directly so they stay accurate between frames.
pub struct Timer {
    start: Instant,
    last_frame: Instant,
    delta_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Restart the timer from zero
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time between the last two updates in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Seconds since the timer started, single precision
    pub fn elapsed_mediump(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Seconds since the timer started, double precision
    pub fn elapsed_highp(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = Timer::new();
        let first = timer.elapsed_highp();
        let second = timer.elapsed_highp();
        assert!(second >= first);
    }

    #[test]
    fn test_reset_clears_frame_count() {
        let mut timer = Timer::new();
        timer.update();
        timer.reset();
        assert_eq!(timer.frame_count(), 0);
    }
}
