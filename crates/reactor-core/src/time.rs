//! Frame-counted simulation time
//!
//! All durations in the engine are frame counts. Nothing waits on a wall clock:
//! a simulation advances one frame at a time and every timer (aura decay, ICD
//! windows, effect lifetimes) is derived from the frame counter.

use serde::{Deserialize, Serialize};

/// A discrete unit of logical time
pub type Frame = u64;

/// Frames per simulated second
pub const FRAMES_PER_SECOND: u64 = 60;

/// Length of one frame in seconds
pub const SECONDS_PER_FRAME: f64 = 1.0 / FRAMES_PER_SECOND as f64;

/// Convert a frame count to seconds
pub fn frames_to_seconds(frames: Frame) -> f64 {
    frames as f64 * SECONDS_PER_FRAME
}

/// Convert seconds to the nearest whole frame count
pub fn seconds_to_frames(seconds: f64) -> Frame {
    (seconds.max(0.0) * FRAMES_PER_SECOND as f64).round() as Frame
}

/// Monotonic frame counter owned by one simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameClock {
    frame: Frame,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at a given frame (used when resuming from a snapshot)
    pub fn starting_at(frame: Frame) -> Self {
        Self { frame }
    }

    /// Current frame
    pub fn now(&self) -> Frame {
        self.frame
    }

    /// Advance by one frame. Returns the elapsed time in seconds.
    pub fn advance(&mut self) -> f64 {
        self.frame += 1;
        SECONDS_PER_FRAME
    }

    /// Seconds elapsed since frame zero
    pub fn elapsed_seconds(&self) -> f64 {
        frames_to_seconds(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_conversions() {
        assert_eq!(seconds_to_frames(2.5), 150);
        assert_eq!(seconds_to_frames(-1.0), 0);
        assert!((frames_to_seconds(90) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_clock_advance() {
        let mut clock = FrameClock::new();
        let dt = clock.advance();
        assert_eq!(clock.now(), 1);
        assert!((dt - 1.0 / 60.0).abs() < 1e-12);

        for _ in 0..59 {
            clock.advance();
        }
        assert!((clock.elapsed_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clock_resume() {
        let clock = FrameClock::starting_at(300);
        assert_eq!(clock.now(), 300);
    }
}
