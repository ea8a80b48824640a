//! lartpx-sim: the numerical pipeline for simulating a pixelated
//! LArTPC's detector response — quenching, drifting, pixel association,
//! time-intervals, induced current, pixel summation, front-end
//! digitization, and the batch orchestrator tying them together.
//!
//! Every stage is a free function over [`lartpx_core::SegmentBatch`]
//! and the buffer types defined alongside it, parallelized with
//! `rayon`. [`orchestrator::simulate_batch`] is the single entry point
//! a caller needs.

pub mod drifting;
pub mod frontend;
pub mod induced_current;
pub mod orchestrator;
pub mod pixel_association;
pub mod pixel_summation;
pub mod quenching;
pub mod rng;
pub mod time_intervals;

pub use lartpx_core::{Error, Result};
pub use orchestrator::{simulate_batch, SimState};

/// Fixed bound on contributing-track slots per unique pixel (spec §3's
/// `K` in `track_pixel_map[U, K]`).
pub const TRACK_SLOTS: usize = 5;

/// Bounded retry count for `CapacityExceeded` (spec §7): the batch is
/// re-run with a doubled bound up to this many times before the error
/// is surfaced to the caller.
pub const MAX_CAPACITY_RETRIES: usize = 4;
