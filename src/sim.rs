//! In-memory ring device for tests and the demo player
//!
//! Models the observable behavior of a looping hardware buffer: a play
//! cursor that advances with simulated time, a write cursor holding a fixed
//! lead over it, and a lock that splits at the seam. Failure injection hooks
//! let tests drive the engine's skip-and-resync paths.

use crate::device::{Cursors, DeviceError, RingDevice};
use crate::format::AudioFormat;

pub struct SimDevice {
    buffer: Vec<u8>,
    block_align: u32,
    bytes_per_second: u32,
    play: u32,
    /// Fixed lead of the write cursor over the play cursor, in bytes
    write_lead: u32,
    /// Sub-frame remainder carried between advances
    carry: f64,
    locked: Option<(u32, u32)>,
    fail_queries: u32,
    fail_next_lock: bool,
    fail_next_unlock: bool,
    lock_calls: u64,
}

impl SimDevice {
    /// One-time buffer setup; capacity is one second of `format` audio.
    pub fn new(format: &AudioFormat, write_lead: u32) -> Self {
        let capacity = format.ring_capacity();
        assert!(write_lead < capacity, "write lead must fit inside the ring");
        Self {
            buffer: vec![0; capacity as usize],
            block_align: format.block_align(),
            bytes_per_second: format.bytes_per_second(),
            play: 0,
            write_lead,
            carry: 0.0,
            locked: None,
            fail_queries: 0,
            fail_next_lock: false,
            fail_next_unlock: false,
            lock_calls: 0,
        }
    }

    /// Advance the play cursor by `seconds` of playback, whole sample frames
    /// at a time. The fractional remainder carries over to the next call so
    /// long runs don't drift.
    pub fn advance(&mut self, seconds: f64) {
        self.carry += seconds * self.bytes_per_second as f64;
        let whole = self.carry as u64;
        let aligned = whole - whole % self.block_align as u64;
        self.carry -= aligned as f64;
        self.advance_bytes((aligned % self.buffer.len() as u64) as u32);
    }

    pub fn advance_bytes(&mut self, bytes: u32) {
        self.play = ((self.play as u64 + bytes as u64) % self.buffer.len() as u64) as u32;
    }

    /// Make the next `n` cursor queries fail
    pub fn fail_next_queries(&mut self, n: u32) {
        self.fail_queries = n;
    }

    pub fn fail_next_lock(&mut self) {
        self.fail_next_lock = true;
    }

    pub fn fail_next_unlock(&mut self) {
        self.fail_next_unlock = true;
    }

    pub fn play_cursor(&self) -> u32 {
        self.play
    }

    pub fn lock_calls(&self) -> u64 {
        self.lock_calls
    }

    /// Raw ring contents, for inspecting what a write committed
    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }
}

impl RingDevice for SimDevice {
    fn capacity(&self) -> u32 {
        self.buffer.len() as u32
    }

    fn cursors(&mut self) -> Result<Cursors, DeviceError> {
        if self.fail_queries > 0 {
            self.fail_queries -= 1;
            return Err(DeviceError::Query("simulated device hiccup".into()));
        }
        let capacity = self.buffer.len() as u32;
        Ok(Cursors {
            play: self.play,
            write: ((self.play as u64 + self.write_lead as u64) % capacity as u64) as u32,
        })
    }

    fn lock(&mut self, offset: u32, bytes: u32) -> Result<(&mut [u8], &mut [u8]), DeviceError> {
        let capacity = self.buffer.len() as u32;
        if self.fail_next_lock {
            self.fail_next_lock = false;
            return Err(DeviceError::Lock {
                offset,
                bytes,
                reason: "simulated lock failure".into(),
            });
        }
        if self.locked.is_some() {
            return Err(DeviceError::Lock {
                offset,
                bytes,
                reason: "already locked".into(),
            });
        }
        if offset >= capacity || bytes > capacity {
            return Err(DeviceError::Lock {
                offset,
                bytes,
                reason: format!("out of range for capacity {capacity}"),
            });
        }
        self.lock_calls += 1;
        self.locked = Some((offset, bytes));

        // Split exactly at the seam when the request wraps
        let first = bytes.min(capacity - offset) as usize;
        let second = bytes as usize - first;
        let (head, tail) = self.buffer.split_at_mut(offset as usize);
        Ok((&mut tail[..first], &mut head[..second]))
    }

    fn unlock(&mut self, offset: u32, bytes: u32) -> Result<(), DeviceError> {
        if self.fail_next_unlock {
            self.fail_next_unlock = false;
            self.locked = None;
            return Err(DeviceError::Unlock("simulated unlock failure".into()));
        }
        match self.locked.take() {
            Some(range) if range == (offset, bytes) => Ok(()),
            Some(_) => Err(DeviceError::Unlock("range does not match lock".into())),
            None => Err(DeviceError::Unlock("nothing locked".into())),
        }
    }
}
