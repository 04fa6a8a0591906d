//! Frame timing

use std::time::{Duration, Instant};

/// Wall-clock timing for the frame loop.
///
/// Tracks when the previous flip happened and the target duration of one
/// frame. The sync engine only consumes `seconds_since_flip()`; pacing the
/// loop itself belongs to the caller.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_flip: Instant,
    target_frame: Duration,
}

impl FrameClock {
    pub fn new(update_hz: u32) -> Self {
        Self {
            last_flip: Instant::now(),
            target_frame: Duration::from_secs(1) / update_hz.max(1),
        }
    }

    /// Seconds elapsed since the previous flip
    pub fn seconds_since_flip(&self) -> f64 {
        self.last_flip.elapsed().as_secs_f64()
    }

    /// Record the flip that just happened
    pub fn mark_flip(&mut self) {
        self.last_flip = Instant::now();
    }

    /// Target duration of one frame
    pub fn target_frame(&self) -> Duration {
        self.target_frame
    }

    /// Time left until the next flip target; zero if the frame already overran
    pub fn until_next_flip(&self) -> Duration {
        self.target_frame.saturating_sub(self.last_flip.elapsed())
    }
}
