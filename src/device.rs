//! Hardware ring device boundary
//!
//! The engine never talks to an audio driver directly. It sees a lockable
//! circular byte buffer that reports two cursors, queried once per frame.
//! Every failure at this boundary is a value; the engine turns them all into
//! a skipped frame, never a crash.

use thiserror::Error;

/// Hardware cursor pair, both byte offsets modulo the ring capacity.
///
/// `play` is the byte currently audible. `write` is the nearest byte the
/// hardware guarantees not to read before the next query; everything between
/// the two is already latched for playback and must not be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    pub play: u32,
    pub write: u32,
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("cursor query failed: {0}")]
    Query(String),
    #[error("lock({offset}, {bytes}) failed: {reason}")]
    Lock {
        offset: u32,
        bytes: u32,
        reason: String,
    },
    #[error("unlock failed: {0}")]
    Unlock(String),
    #[error("device unavailable")]
    Unavailable,
}

/// A fixed-capacity circular hardware buffer.
///
/// There is exactly one writer (the sync engine) and one concurrent reader
/// (the hardware). All calls are blocking but complete within the frame;
/// `cursors()` in particular must return an error on a device hiccup rather
/// than hang.
pub trait RingDevice {
    /// Ring capacity in bytes
    fn capacity(&self) -> u32;

    /// Current hardware cursors
    fn cursors(&mut self) -> Result<Cursors, DeviceError>;

    /// Lock `bytes` starting at `offset` for writing.
    ///
    /// Returns the two writable regions; the second is empty unless the
    /// request wraps past the buffer end, in which case the split is exactly
    /// at the seam. `bytes` may be at most the full capacity.
    fn lock(&mut self, offset: u32, bytes: u32) -> Result<(&mut [u8], &mut [u8]), DeviceError>;

    /// Commit a previously locked range back to the hardware
    fn unlock(&mut self, offset: u32, bytes: u32) -> Result<(), DeviceError>;
}
