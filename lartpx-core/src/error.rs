//! Error types for lartpx-core.

use thiserror::Error;

/// Result type alias for lartpx-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The resource whose pre-allocated bound was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    /// Active-pixel rows (`Pmax`).
    ActivePixels,
    /// Neighboring-pixel rows (`Pmax * (2r+1)^2`).
    NeighboringPixels,
    /// Contributing-track slots per unique pixel (`K`).
    TrackPixelSlots,
}

impl std::fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CapacityKind::ActivePixels => "active pixels",
            CapacityKind::NeighboringPixels => "neighboring pixels",
            CapacityKind::TrackPixelSlots => "track-pixel slots",
        };
        f.write_str(name)
    }
}

/// Core error types for lartpx operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown recombination model, unreadable descriptor, or a missing
    /// required key with no documented default.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable explanation.
        reason: String,
    },

    /// A segment is degenerate (zero length on the anode projection and
    /// zero drift) and cannot be processed.
    #[error("invalid input at segment {segment_index}: {reason}")]
    InvalidInput {
        /// Index of the offending segment within its batch.
        segment_index: usize,
        /// Human-readable explanation.
        reason: String,
    },

    /// A NaN or otherwise non-physical value was produced mid-pipeline.
    /// Fatal for the current batch.
    #[error("numeric fault: {reason}")]
    NumericFault {
        /// Human-readable explanation.
        reason: String,
    },

    /// A pre-allocated buffer bound was exceeded; the caller should
    /// double the bound and retry the batch.
    #[error("capacity exceeded for {kind}: needed {needed}, have {have}")]
    CapacityExceeded {
        /// Which bound was exceeded.
        kind: CapacityKind,
        /// The bound that would have been required.
        needed: usize,
        /// The bound that was actually allocated.
        have: usize,
    },
}
