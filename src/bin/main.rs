//! Ringsync demo player
//!
//! Runs the sync engine against a simulated ring device, feeding it the
//! classic 261 Hz test tone frame by frame.
//!
//! # Usage
//!
//! ```bash
//! ringsync
//! ringsync --seconds 10 --fps 60
//! ringsync --latency-ms 40 --jitter-ms 8
//! RUST_LOG=ringsync=trace ringsync
//! ```

use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use tracing::{debug, info, trace};

use ringsync::{AudioFormat, FrameClock, SimDevice, SyncConfig, SyncEngine};

#[derive(Parser)]
#[command(name = "ringsync")]
#[command(author, version, about = "Frame-synchronized audio ring demo")]
struct Args {
    /// Seconds of audio to run
    #[arg(long, default_value = "5")]
    seconds: f64,

    /// Output sample rate in Hz
    #[arg(long, default_value = "48000")]
    rate: u32,

    /// Frame update rate in Hz
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Simulated write-cursor lead in milliseconds
    #[arg(long, default_value = "10")]
    latency_ms: u32,

    /// Random extra frame time in milliseconds, to exercise jitter handling
    #[arg(long, default_value = "0")]
    jitter_ms: u64,

    /// Test tone frequency in Hz
    #[arg(long, default_value = "261")]
    tone_hz: u32,
}

/// Sine test tone; phase follows the sample index so frames join seamlessly
struct ToneGenerator {
    period_samples: u64,
    sample_index: u64,
}

impl ToneGenerator {
    const VOLUME: f64 = 5_000.0;

    fn new(format: &AudioFormat, tone_hz: u32) -> Self {
        Self {
            period_samples: (format.sample_rate / tone_hz.max(1)).max(1) as u64,
            sample_index: 0,
        }
    }

    fn fill(&mut self, out: &mut Vec<i16>, frames: usize) {
        out.clear();
        for _ in 0..frames {
            let phase =
                TAU * (self.sample_index % self.period_samples) as f64 / self.period_samples as f64;
            let value = (phase.sin() * Self::VOLUME) as i16;
            out.push(value);
            out.push(value);
            self.sample_index += 1;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let format = AudioFormat::new(args.rate);
    let config = SyncConfig {
        update_hz: args.fps,
        ..ringsync::config::load()
    };

    let lead_raw = args.latency_ms * (format.bytes_per_second() / 1_000);
    let write_lead = lead_raw - lead_raw % format.block_align();
    info!(
        rate = format.sample_rate,
        fps = config.update_hz,
        write_lead,
        safety_bytes = config.safety_bytes(&format),
        "starting ringsync demo"
    );

    let device = SimDevice::new(&format, write_lead);
    let mut engine = SyncEngine::new(device, format, &config);
    let mut tone = ToneGenerator::new(&format, args.tone_hz);
    let mut scratch = Vec::new();

    // Prime the whole ring before playback begins
    let frames = engine.prefill();
    tone.fill(&mut scratch, frames);
    engine.submit(&scratch);

    let mut clock = FrameClock::new(config.update_hz);
    let mut last_advance = Instant::now();
    let total_frames = (args.seconds * config.update_hz as f64).round() as u64;

    for frame in 0..total_frames {
        let frame_start = Instant::now();

        let want = engine.calc_samples_to_write(clock.seconds_since_flip());
        tone.fill(&mut scratch, want);
        let wrote = engine.submit(&scratch);
        trace!(frame, want, wrote, "frame submitted");

        let jitter = if args.jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..=args.jitter_ms))
        } else {
            Duration::ZERO
        };
        thread::sleep(clock.until_next_flip() + jitter);

        // The simulated hardware consumes in real time
        engine
            .device_mut()
            .advance(last_advance.elapsed().as_secs_f64());
        last_advance = Instant::now();
        clock.mark_flip();

        let ms = frame_start.elapsed().as_secs_f64() * 1000.0;
        debug!("{:.0} f/s, {:.1} ms/f", 1000.0 / ms, ms);
    }

    let metrics = engine.metrics();
    info!(
        frames = metrics.total_frames,
        samples = metrics.total_sample_frames,
        skipped = metrics.total_skipped,
        glitches = metrics.total_glitches,
        "demo finished"
    );
    Ok(())
}
