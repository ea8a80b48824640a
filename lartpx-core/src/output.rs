//! Output record types shared between the simulation pipeline and the
//! I/O layer (spec §6).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One digitized ADC sample emitted by the front end (spec §4.H/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdcSample {
    /// Event this sample belongs to.
    pub event_id: u64,
    /// Encoded pixel ID (see [`crate::pixel::PixelCoord::to_id`]).
    pub pixel_id: i64,
    /// Quantized ADC count, in `[0, adc_counts)`.
    pub adc_count: u32,
    /// Absolute timestamp, in clock ticks, wrapped modulo
    /// `rollover_cycles`.
    pub timestamp_ticks: u64,
}

/// MC-truth attribution of one ADC sample to its contributing segments:
/// `(segment_index, fraction)` pairs whose fractions sum to ~1 when the
/// sample's integral is nonzero (spec §6).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TruthContribution {
    /// Index of the [`AdcSample`] this truth record describes, within
    /// the batch's output list.
    pub sample_index: usize,
    /// `(segment_index, fraction)` pairs.
    pub fractions: Vec<(usize, f64)>,
}
