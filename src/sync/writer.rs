//! Copying generated samples into the locked ring regions

use bytemuck::cast_slice;
use tracing::warn;

use crate::device::{DeviceError, RingDevice};
use crate::format::AudioFormat;

use super::planner::WritePlan;

/// Owns the running sample index: the generator's notion of "where am I" in
/// the stream, independent of where the hardware cursors currently sit.
#[derive(Debug, Default)]
pub struct RingWriter {
    running_sample_index: u64,
}

impl RingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample frames generated since stream start (or the last resync)
    pub fn running_sample_index(&self) -> u64 {
        self.running_sample_index
    }

    /// Byte the next write lands on, modulo the ring capacity
    pub fn output_location(&self, format: &AudioFormat) -> u32 {
        format.wrap(self.running_sample_index * format.block_align() as u64)
    }

    /// Restart the running index so the next write begins at `cursor`
    pub fn resync_to(&mut self, cursor: u32, format: &AudioFormat) {
        self.running_sample_index = (cursor / format.block_align()) as u64;
    }

    /// Lock the planned region, copy `samples` into it (split at the seam if
    /// needed), and commit.
    ///
    /// The source must hold at least `plan.sample_frames` frames; coming up
    /// short is a caller bug. Release builds clamp to what was provided
    /// rather than commit uninitialized bytes. Unlock always runs after the
    /// copy; if it fails the frame is lost and the index does not advance,
    /// so the next frame replans from fresh cursors.
    pub fn write<D: RingDevice>(
        &mut self,
        device: &mut D,
        plan: &WritePlan,
        samples: &[i16],
        format: &AudioFormat,
    ) -> Result<usize, DeviceError> {
        let channels = format.channels as usize;
        let frames_available = samples.len() / channels;
        debug_assert!(
            frames_available >= plan.sample_frames,
            "generator produced {frames_available} frames, plan needs {}",
            plan.sample_frames
        );
        let frames = plan.sample_frames.min(frames_available);
        if frames < plan.sample_frames {
            warn!(
                provided = frames_available,
                needed = plan.sample_frames,
                "short sample buffer, clamping write"
            );
        }
        if frames == 0 {
            return Ok(0);
        }
        let bytes = frames as u32 * format.block_align();

        let src: &[u8] = cast_slice(&samples[..frames * channels]);
        let mut committed = 0usize;
        {
            let (region1, region2) = device.lock(plan.offset, bytes)?;
            let n1 = region1.len().min(src.len());
            region1[..n1].copy_from_slice(&src[..n1]);
            let n2 = region2.len().min(src.len() - n1);
            region2[..n2].copy_from_slice(&src[n1..n1 + n2]);
            committed += n1 + n2;
        }
        device.unlock(plan.offset, bytes)?;

        let frames_committed = committed / format.block_align() as usize;
        self.running_sample_index += frames_committed as u64;
        Ok(frames_committed)
    }
}
