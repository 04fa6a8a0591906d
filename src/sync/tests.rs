//! Engine scenario tests against the simulated device

use super::*;
use crate::config::SyncConfig;
use crate::format::AudioFormat;
use crate::sim::SimDevice;

/// 44.1 kHz stereo 16-bit: 176_400 B/s, 5_880 B/frame at 30 Hz,
/// 1_960 safety bytes
fn engine_44k(write_lead: u32) -> SyncEngine<SimDevice> {
    let format = AudioFormat::new(44_100);
    let device = SimDevice::new(&format, write_lead);
    SyncEngine::new(device, format, &SyncConfig::default())
}

fn silence(frames: usize) -> Vec<i16> {
    vec![0; frames * 2]
}

#[test]
fn first_frame_end_to_end() {
    let mut engine = engine_44k(2_000);

    // 10ms into a 33ms frame: flip predicted at byte 4_116, low latency,
    // target one frame past that at 9_996
    let frames = engine.calc_samples_to_write(0.01);

    // The first query pins the running index to the write cursor (2_000),
    // so the plan covers 2_000..9_996
    assert_eq!(engine.output_location(), 2_000);
    assert_eq!(frames, 7_996 / 4);

    let wrote = engine.submit(&silence(frames));
    assert_eq!(wrote, frames);
    assert_eq!(engine.output_location(), 9_996);
    assert_eq!(engine.metrics().low_latency_frames, 1);
}

#[test]
fn query_failure_skips_the_frame_entirely() {
    let mut engine = engine_44k(2_000);
    engine.device_mut().fail_next_queries(1);

    assert_eq!(engine.calc_samples_to_write(0.01), 0);
    // No plan means submit has nothing to write, and the device was never
    // locked this frame
    assert_eq!(engine.submit(&silence(0)), 0);
    assert_eq!(engine.device_mut().lock_calls(), 0);
    assert_eq!(engine.metrics().total_skipped, 1);
}

#[test]
fn recovery_resyncs_to_the_write_cursor() {
    let mut engine = engine_44k(2_000);
    engine.device_mut().fail_next_queries(1);
    assert_eq!(engine.calc_samples_to_write(0.0), 0);

    // Hardware kept playing while we were deaf
    engine.device_mut().advance_bytes(4_000);
    let frames = engine.calc_samples_to_write(0.0);
    assert!(frames > 0);
    // Running index restarted at the current write cursor: 4_000 + 2_000
    assert_eq!(engine.output_location(), 6_000);
    assert_eq!(engine.metrics().resyncs, 1);
}

#[test]
fn lock_failure_drops_the_frame_and_resyncs() {
    let mut engine = engine_44k(2_000);
    let frames = engine.calc_samples_to_write(0.0);
    assert!(frames > 0);
    let index_before = engine.running_sample_index();

    engine.device_mut().fail_next_lock();
    assert_eq!(engine.submit(&silence(frames)), 0);
    assert_eq!(engine.metrics().total_skipped, 1);
    // A lost frame never advances the bookkeeping
    assert_eq!(engine.running_sample_index(), index_before);

    // The next successful query resynchronizes
    engine.device_mut().advance_bytes(5_880);
    engine.calc_samples_to_write(0.0);
    assert_eq!(engine.metrics().resyncs, 2);
}

#[test]
fn steady_frames_cross_the_seam_without_glitches() {
    let mut engine = engine_44k(2_000);
    let mut total = 0u64;
    let mut last_index = 0;

    // Two seconds of 30 Hz frames laps the one-second ring twice
    for _ in 0..60 {
        let frames = engine.calc_samples_to_write(0.0);
        let wrote = engine.submit(&silence(frames));
        assert_eq!(wrote, frames);
        total += wrote as u64;

        assert!(engine.running_sample_index() >= last_index);
        last_index = engine.running_sample_index();

        engine.device_mut().advance_bytes(5_880);
    }

    // First frame fills 2_000..11_760, then 5_880 B/frame steady state
    assert_eq!(total, 2_440 + 59 * 1_470);
    assert_eq!(engine.metrics().total_frames, 60);
    assert_eq!(engine.metrics().total_glitches, 0);
}

#[test]
fn play_cursor_overtaking_the_fill_is_counted() {
    let mut engine = engine_44k(2_000);
    let frames = engine.calc_samples_to_write(0.0);
    engine.submit(&silence(frames));

    // The fill extends to byte 11_760; a stalled frame loop lets the
    // hardware play far past it
    engine.device_mut().advance_bytes(30_000);
    engine.calc_samples_to_write(0.0);
    assert_eq!(engine.metrics().total_glitches, 1);
}

#[test]
fn prefill_primes_the_whole_ring() {
    let mut engine = engine_44k(2_000);
    let frames = engine.prefill();
    assert_eq!(frames, 44_100);

    let samples: Vec<i16> = (0..frames)
        .flat_map(|v| {
            let value = (v % 1_000) as i16;
            [value, value]
        })
        .collect();
    assert_eq!(engine.submit(&samples), frames);

    // The whole second landed in the ring
    let contents = engine.device_mut().contents();
    assert_eq!(contents.len(), 176_400);
    assert_ne!(&contents[4..8], &[0, 0, 0, 0]);

    // Playback start still pins the index to the hardware write cursor
    engine.calc_samples_to_write(0.0);
    assert_eq!(engine.output_location(), 2_000);
    assert_eq!(engine.metrics().resyncs, 1);
    // The prefill span is not glitch-tracked
    assert_eq!(engine.metrics().total_glitches, 0);
}

#[cfg(feature = "sync-markers")]
#[test]
fn markers_snapshot_every_planned_frame() {
    let mut engine = engine_44k(2_000);
    for _ in 0..3 {
        let frames = engine.calc_samples_to_write(0.0);
        engine.submit(&silence(frames));
        engine.device_mut().advance_bytes(5_880);
    }

    let markers = engine.markers();
    assert_eq!(markers.frames_recorded(), 3);
    // Default depth is update_hz - 1
    assert_eq!(markers.depth(), 29);

    let latest = markers.latest().unwrap();
    assert_eq!(latest.play_cursor, 2 * 5_880);
    assert_eq!(latest.write_cursor, 2 * 5_880 + 2_000);
    assert_eq!(latest.output_bytes, 5_880);
}

#[cfg(feature = "sync-markers")]
#[test]
fn skipped_frames_record_no_marker() {
    let mut engine = engine_44k(2_000);
    engine.device_mut().fail_next_queries(1);
    engine.calc_samples_to_write(0.0);
    assert_eq!(engine.markers().frames_recorded(), 0);
}
