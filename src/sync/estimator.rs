//! Next-flip play cursor prediction and latency classification
//!
//! Once per frame the engine asks: given where the hardware cursors are right
//! now and how far into the frame we already are, up to which byte should
//! this frame's write extend? All arithmetic here runs unwrapped (monotonic
//! past the play cursor) and wraps only at the very end.

use crate::device::Cursors;
use crate::format::AudioFormat;

/// One frame's sync estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEstimate {
    /// Byte the writer should fill up to, modulo the ring capacity
    pub target_cursor: u32,
    /// Whether the device write cursor trails the predicted flip position
    /// far enough for frame-perfect sync
    pub low_latency: bool,
    /// Predicted play cursor at the next flip, modulo the ring capacity
    pub expected_flip_play: u32,
}

/// Compute the write target for the current frame.
///
/// Low-latency devices get audio written exactly one frame past the predicted
/// next-flip play position. High-latency devices can't be synced to the flip,
/// so the target is one frame plus the safety cushion past whatever the
/// hardware has already committed.
pub fn estimate_target(
    cursors: Cursors,
    seconds_since_flip: f64,
    format: &AudioFormat,
    bytes_per_update: u32,
    safety_bytes: u32,
) -> FrameEstimate {
    let capacity = format.ring_capacity() as u64;
    let play = cursors.play as u64;

    // Unwrap the write cursor past the play cursor so comparisons below are
    // monotonic rather than modular.
    let mut write_unwrapped = cursors.write as u64;
    if write_unwrapped < play {
        write_unwrapped += capacity;
    }

    // Bytes the hardware will consume between now and the next flip. A frame
    // that already overran its budget predicts the flip at the current play
    // position.
    let consumed = (format.bytes_per_second() as f64 * seconds_since_flip) as u64;
    let bytes_until_flip = (bytes_per_update as u64).saturating_sub(consumed);
    let expected_flip_play = play + bytes_until_flip;

    let low_latency = write_unwrapped + (safety_bytes as u64) < expected_flip_play;

    let target_unwrapped = if low_latency {
        expected_flip_play + bytes_per_update as u64
    } else {
        write_unwrapped + bytes_per_update as u64 + safety_bytes as u64
    };

    // Targets stay on sample-frame boundaries regardless of how the elapsed
    // time quantized, otherwise the ring phase drifts off the frame grid.
    let aligned = target_unwrapped - target_unwrapped % format.block_align() as u64;

    FrameEstimate {
        target_cursor: format.wrap(aligned),
        low_latency,
        expected_flip_play: format.wrap(expected_flip_play),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_44k() -> AudioFormat {
        AudioFormat::new(44_100)
    }

    #[test]
    fn low_latency_device_targets_one_frame_past_flip() {
        let format = format_44k();
        let estimate = estimate_target(
            Cursors {
                play: 0,
                write: 2_000,
            },
            0.01,
            &format,
            5_880,
            1_960,
        );
        // 1_764 bytes consumed 10ms into the frame, flip predicted at 4_116
        assert!(estimate.low_latency);
        assert_eq!(estimate.expected_flip_play, 4_116);
        assert_eq!(estimate.target_cursor, 9_996);
    }

    #[test]
    fn high_latency_device_targets_past_write_cursor() {
        let format = format_44k();
        let estimate = estimate_target(
            Cursors {
                play: 0,
                write: 6_000,
            },
            0.01,
            &format,
            5_880,
            1_960,
        );
        // 6_000 + 1_960 is past the predicted flip at 4_116
        assert!(!estimate.low_latency);
        assert_eq!(estimate.target_cursor, 6_000 + 5_880 + 1_960);
    }

    #[test]
    fn identical_inputs_give_identical_estimates() {
        let format = format_44k();
        let cursors = Cursors {
            play: 40_000,
            write: 42_000,
        };
        let a = estimate_target(cursors, 0.005, &format, 5_880, 1_960);
        let b = estimate_target(cursors, 0.005, &format, 5_880, 1_960);
        assert_eq!(a, b);
    }

    #[test]
    fn target_wraps_into_capacity() {
        let format = format_44k();
        let capacity = format.ring_capacity();
        let estimate = estimate_target(
            Cursors {
                play: capacity - 2_000,
                write: capacity - 500,
            },
            0.0,
            &format,
            5_880,
            1_960,
        );
        assert!(estimate.target_cursor < capacity);
        // play + 5_880 wraps: flip lands 3_880 past the seam
        assert_eq!(estimate.expected_flip_play, 3_880);
    }

    #[test]
    fn target_stays_frame_aligned() {
        let format = format_44k();
        // An awkward elapsed time quantizes to a non-aligned byte count
        let estimate = estimate_target(
            Cursors {
                play: 0,
                write: 2_000,
            },
            0.0101,
            &format,
            5_880,
            1_960,
        );
        assert_eq!(estimate.target_cursor % format.block_align(), 0);
    }

    #[test]
    fn overrun_frame_predicts_flip_at_play_cursor() {
        let format = format_44k();
        // 50ms elapsed on a 33ms frame: the flip already happened
        let estimate = estimate_target(
            Cursors {
                play: 10_000,
                write: 12_000,
            },
            0.05,
            &format,
            5_880,
            1_960,
        );
        assert_eq!(estimate.expected_flip_play, 10_000);
        // Write cursor is never behind play, so this degrades to high latency
        assert!(!estimate.low_latency);
    }

    #[test]
    fn low_latency_target_never_behind_play_cursor() {
        let format = format_44k();
        for play in [0u32, 5_000, 100_000, 176_000] {
            let estimate = estimate_target(
                Cursors {
                    play,
                    write: (play + 400) % format.ring_capacity(),
                },
                0.002,
                &format,
                5_880,
                1_960,
            );
            assert!(estimate.low_latency);
            // Forward distance from play to target covers at least one frame
            let ahead = format.forward_distance(play, estimate.target_cursor);
            assert!(ahead >= 5_880, "target only {ahead} bytes ahead of play");
        }
    }
}
