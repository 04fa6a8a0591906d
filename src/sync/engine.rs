//! Per-frame audio synchronization engine

use tracing::{debug, trace, warn};

use crate::config::SyncConfig;
use crate::device::{Cursors, RingDevice};
use crate::format::AudioFormat;

use super::estimator::estimate_target;
use super::metrics::SyncMetrics;
use super::planner::{WritePlan, plan_region};
use super::writer::RingWriter;

#[cfg(feature = "sync-markers")]
use super::markers::{MarkerHistory, SyncMarker};

/// A frame planned by `calc_samples_to_write`, waiting for its samples
#[derive(Debug, Clone, Copy)]
struct PendingFrame {
    plan: WritePlan,
    play_at_plan: u32,
}

/// The span committed by the previous successful write, kept to detect the
/// play cursor overtaking it (an audible glitch)
#[derive(Debug, Clone, Copy)]
struct CommittedSpan {
    play_at_plan: u32,
    fill_end: u32,
}

/// Frame-stepped synchronization against a lockable hardware ring.
///
/// One instance per output stream; the owning frame loop calls
/// `calc_samples_to_write` once per frame, generates that many sample frames,
/// and hands them to `submit`. Device failures are absorbed: the frame is
/// skipped and the running index resynchronizes to the hardware write cursor
/// on the next successful query.
pub struct SyncEngine<D: RingDevice> {
    device: D,
    format: AudioFormat,
    bytes_per_update: u32,
    safety_bytes: u32,
    writer: RingWriter,
    pending: Option<PendingFrame>,
    committed: Option<CommittedSpan>,
    /// False until the running index has been pinned to real hardware
    /// cursors, and again after any device failure
    sound_valid: bool,
    metrics: SyncMetrics,
    #[cfg(feature = "sync-markers")]
    markers: MarkerHistory,
}

impl<D: RingDevice> SyncEngine<D> {
    pub fn new(device: D, format: AudioFormat, config: &SyncConfig) -> Self {
        assert_eq!(
            device.capacity(),
            format.ring_capacity(),
            "ring capacity must be one second of audio"
        );
        Self {
            device,
            format,
            bytes_per_update: format.bytes_per_update(config.update_hz),
            safety_bytes: config.safety_bytes(&format),
            writer: RingWriter::new(),
            pending: None,
            committed: None,
            sound_valid: false,
            metrics: SyncMetrics::new(),
            #[cfg(feature = "sync-markers")]
            markers: MarkerHistory::new(config.marker_depth()),
        }
    }

    /// How many sample frames the generator must produce this frame.
    ///
    /// Queries the hardware cursors, predicts the next flip, and plans the
    /// write region. Returns 0 on a device failure; the engine resyncs on the
    /// next successful query.
    pub fn calc_samples_to_write(&mut self, seconds_since_flip: f64) -> usize {
        self.metrics.maybe_log();

        let cursors = match self.device.cursors() {
            Ok(cursors) => cursors,
            Err(err) => {
                self.skip_frame();
                debug!("cursor query failed, skipping frame: {err}");
                return 0;
            }
        };

        if !self.sound_valid {
            // First frame, or first after a device hiccup: restart the
            // running index at the hardware's committed horizon.
            self.writer.resync_to(cursors.write, &self.format);
            self.sound_valid = true;
            self.committed = None;
            self.metrics.resyncs += 1;
            debug!(
                play = cursors.play,
                write = cursors.write,
                "resynchronized running index to hardware write cursor"
            );
        }

        self.detect_glitch(&cursors);

        let estimate = estimate_target(
            cursors,
            seconds_since_flip,
            &self.format,
            self.bytes_per_update,
            self.safety_bytes,
        );
        let output_location = self.writer.output_location(&self.format);
        let plan = plan_region(output_location, estimate.target_cursor, &self.format);

        self.metrics.frames_planned += 1;
        self.metrics.total_frames += 1;
        if estimate.low_latency {
            self.metrics.low_latency_frames += 1;
        } else {
            self.metrics.high_latency_frames += 1;
        }

        #[cfg(feature = "sync-markers")]
        self.markers.record(SyncMarker {
            play_cursor: cursors.play,
            write_cursor: cursors.write,
            output_location,
            output_bytes: plan.bytes,
            expected_flip_play: estimate.expected_flip_play,
        });

        trace!(
            play = cursors.play,
            write = cursors.write,
            output = output_location,
            target = estimate.target_cursor,
            bytes = plan.bytes,
            low_latency = estimate.low_latency,
            "planned frame write"
        );

        self.pending = Some(PendingFrame {
            plan,
            play_at_plan: cursors.play,
        });
        plan.sample_frames
    }

    /// Write the generated samples for the frame planned by the last
    /// `calc_samples_to_write`. Returns the sample frames committed; device
    /// failures degrade to a dropped frame (0), never an error upward.
    pub fn submit(&mut self, samples: &[i16]) -> usize {
        let Some(pending) = self.pending.take() else {
            return 0;
        };

        match self
            .writer
            .write(&mut self.device, &pending.plan, samples, &self.format)
        {
            Ok(frames) => {
                self.metrics.sample_frames_written += frames as u64;
                self.metrics.total_sample_frames += frames as u64;
                if frames > 0 && self.sound_valid {
                    let bytes = frames as u64 * self.format.block_align() as u64;
                    self.committed = Some(CommittedSpan {
                        play_at_plan: pending.play_at_plan,
                        fill_end: self
                            .format
                            .wrap(pending.plan.offset as u64 + bytes),
                    });
                }
                frames
            }
            Err(err) => {
                self.skip_frame();
                warn!("ring write failed, dropping frame: {err}");
                0
            }
        }
    }

    /// Plan a one-time fill of the entire ring, for priming the buffer before
    /// playback starts. The next regular frame still resynchronizes to the
    /// hardware cursors; the prefilled audio just covers the gap until then.
    pub fn prefill(&mut self) -> usize {
        let capacity = self.format.ring_capacity();
        let plan = WritePlan {
            offset: 0,
            bytes: capacity,
            sample_frames: (capacity / self.format.block_align()) as usize,
        };
        self.pending = Some(PendingFrame {
            plan,
            play_at_plan: 0,
        });
        plan.sample_frames
    }

    /// Play cursor past the previously committed fill means the hardware ran
    /// dry and looped stale audio: log it, count it, let the next frames
    /// rewrite the region. Never auto-corrected beyond that.
    fn detect_glitch(&mut self, cursors: &Cursors) {
        let Some(span) = self.committed else {
            return;
        };
        let consumed = self.format.forward_distance(span.play_at_plan, cursors.play);
        let depth = self.format.forward_distance(span.play_at_plan, span.fill_end);
        if consumed > depth {
            self.metrics.glitches += 1;
            self.metrics.total_glitches += 1;
            if self.metrics.total_glitches <= 10 || self.metrics.total_glitches.is_multiple_of(100)
            {
                warn!(
                    play = cursors.play,
                    fill_end = span.fill_end,
                    overshoot = consumed - depth,
                    "play cursor overtook committed audio"
                );
            }
        }
    }

    fn skip_frame(&mut self) {
        self.sound_valid = false;
        self.pending = None;
        self.committed = None;
        self.metrics.frames_skipped += 1;
        self.metrics.total_skipped += 1;
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn safety_bytes(&self) -> u32 {
        self.safety_bytes
    }

    /// Byte the next write lands on, modulo the ring capacity
    pub fn output_location(&self) -> u32 {
        self.writer.output_location(&self.format)
    }

    pub fn running_sample_index(&self) -> u64 {
        self.writer.running_sample_index()
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Read-only view of the recent cursor history, for visualization
    #[cfg(feature = "sync-markers")]
    pub fn markers(&self) -> &MarkerHistory {
        &self.markers
    }
}
