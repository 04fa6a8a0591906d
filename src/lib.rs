//! Ringsync - frame-synchronized audio ring buffer engine
//!
//! Keeps a fixed-size circular hardware buffer fed from a frame-stepped game
//! loop. Once per frame the engine reads the hardware's play and write
//! cursors, predicts where playback will be at the next flip, and plans
//! exactly how many sample frames the caller's generator must produce and
//! where they land in the ring.
//!
//! The hardware itself stays behind the [`device::RingDevice`] trait: a
//! lockable one-second ring that reports two byte cursors. [`sim::SimDevice`]
//! implements it in memory for tests and the demo binary.

pub mod clock;
pub mod config;
pub mod device;
pub mod format;
pub mod sim;
pub mod sync;

pub use clock::FrameClock;
pub use config::SyncConfig;
pub use device::{Cursors, DeviceError, RingDevice};
pub use format::AudioFormat;
pub use sim::SimDevice;
pub use sync::SyncEngine;
