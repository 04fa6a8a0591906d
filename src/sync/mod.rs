//! Frame-synchronized ring buffer writing
//!
//! Decides, once per frame, how many audio samples to generate and at what
//! offset to write them into the hardware ring, so playback never underruns,
//! never overwrites samples the hardware has already latched, and stays
//! audibly in sync with a variable-length render loop.
//!
//! # Per-frame flow
//!
//! ```text
//! Frame loop                      SyncEngine                      Hardware
//!     │                               │                               │
//! [calc_samples_to_write]────────►[query cursors]◄────(play/write)───│
//!     │                           [estimate next-flip target]         │
//!     │                           [plan write region]                 │
//! [generate samples]                  │                               │
//! [submit]───────────────────────►[lock / split copy / unlock]──────►│
//!     │                           [advance running index]             │
//! [sleep to flip]                     │                               │
//! ```

mod engine;
mod estimator;
mod metrics;
mod planner;
mod writer;

#[cfg(feature = "sync-markers")]
mod markers;

pub use engine::SyncEngine;
pub use estimator::{FrameEstimate, estimate_target};
pub use metrics::SyncMetrics;
pub use planner::{WritePlan, plan_region};
pub use writer::RingWriter;

#[cfg(feature = "sync-markers")]
pub use markers::{MarkerHistory, SyncMarker};

#[cfg(test)]
mod tests;
