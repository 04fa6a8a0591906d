//! Sync engine health counters and periodic logging

use std::time::Instant;

use tracing::debug;

/// Counters for engine health monitoring and diagnostics.
///
/// Interval counters reset on each log line (per-second rates); the `total_*`
/// fields accumulate for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct SyncMetrics {
    /// Frames planned this interval
    pub frames_planned: u64,
    /// Frames skipped on device failure this interval
    pub frames_skipped: u64,
    /// Sample frames committed this interval
    pub sample_frames_written: u64,
    /// Running-index resyncs this interval
    pub resyncs: u64,
    /// Play cursor observed past the committed fill, this interval
    pub glitches: u64,
    /// Frames classified low latency this interval
    pub low_latency_frames: u64,
    /// Frames classified high latency this interval
    pub high_latency_frames: u64,

    pub total_frames: u64,
    pub total_skipped: u64,
    pub total_sample_frames: u64,
    pub total_glitches: u64,

    last_log_time: Instant,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            frames_planned: 0,
            frames_skipped: 0,
            sample_frames_written: 0,
            resyncs: 0,
            glitches: 0,
            low_latency_frames: 0,
            high_latency_frames: 0,
            total_frames: 0,
            total_skipped: 0,
            total_sample_frames: 0,
            total_glitches: 0,
            last_log_time: Instant::now(),
        }
    }

    /// Log a health line if at least a second has passed, then reset the
    /// interval counters.
    pub fn maybe_log(&mut self) {
        if self.last_log_time.elapsed().as_secs() < 1 {
            return;
        }
        debug!(
            "sync: frames={} skipped={} samples={} low={} high={} resyncs={} glitches={}",
            self.frames_planned,
            self.frames_skipped,
            self.sample_frames_written,
            self.low_latency_frames,
            self.high_latency_frames,
            self.resyncs,
            self.glitches,
        );
        self.frames_planned = 0;
        self.frames_skipped = 0;
        self.sample_frames_written = 0;
        self.resyncs = 0;
        self.glitches = 0;
        self.low_latency_frames = 0;
        self.high_latency_frames = 0;
        self.last_log_time = Instant::now();
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
