//! Segment records and the Structure-of-Arrays batch that the pipeline
//! operates on (spec §3).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single track segment: a short straight-line ionization deposit.
///
/// This is the array-of-structs view used at the I/O boundary; the
/// pipeline itself works on the columnar [`SegmentBatch`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentRecord {
    /// Grouping tag; contiguous segments from one event share it.
    pub event_id: u64,
    /// Start point, cm. `z` is the drift axis.
    pub x_start: f64,
    pub y_start: f64,
    pub z_start: f64,
    /// End point, cm.
    pub x_end: f64,
    pub y_end: f64,
    pub z_end: f64,
    /// Midpoint, cm.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Ionization times, us. Repurposed to anode-arrival times by
    /// drifting (spec §4.C).
    pub t_start: f64,
    pub t_end: f64,
    pub t: f64,
    /// Original ionization times, us, preserved across drifting.
    pub t0_start: f64,
    pub t0_end: f64,
    pub t0: f64,
    /// Energy deposit, MeV.
    pub d_e: f64,
    /// Stopping power, MeV/cm.
    pub d_e_dx: f64,
    /// Number of ionization electrons. Filled by quenching.
    pub n_electrons: f64,
    /// Longitudinal diffusion sigma, cm. Filled by drifting.
    pub long_diff: f64,
    /// Transverse diffusion sigma, cm. Filled by drifting.
    pub tran_diff: f64,
    /// Which anode plane this segment drifts toward.
    pub pixel_plane: u32,
    /// Optional photon yield, filled by an external optical LUT stage.
    pub n_photons: Option<f64>,
}

impl SegmentRecord {
    /// True if the segment has zero length on the anode projection
    /// (start and end pixel columns/rows coincide) and zero drift
    /// distance — the degenerate case flagged as `InvalidInput` by
    /// spec §7.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let planar_zero = (self.x_start - self.x_end).abs() < f64::EPSILON
            && (self.y_start - self.y_end).abs() < f64::EPSILON;
        let drift_zero = (self.z_start - self.z_end).abs() < f64::EPSILON
            && (self.z - self.z_start).abs() < f64::EPSILON;
        planar_zero && drift_zero
    }
}

/// A batch of segments stored in Structure-of-Arrays layout, so each
/// pipeline stage can stream over one or a few contiguous `Vec`s rather
/// than bouncing across a wide row of fields per segment.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentBatch {
    pub event_id: Vec<u64>,
    pub x_start: Vec<f64>,
    pub y_start: Vec<f64>,
    pub z_start: Vec<f64>,
    pub x_end: Vec<f64>,
    pub y_end: Vec<f64>,
    pub z_end: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub t_start: Vec<f64>,
    pub t_end: Vec<f64>,
    pub t: Vec<f64>,
    pub t0_start: Vec<f64>,
    pub t0_end: Vec<f64>,
    pub t0: Vec<f64>,
    pub d_e: Vec<f64>,
    pub d_e_dx: Vec<f64>,
    pub n_electrons: Vec<f64>,
    pub long_diff: Vec<f64>,
    pub tran_diff: Vec<f64>,
    pub pixel_plane: Vec<u32>,
    pub n_photons: Vec<f64>,
}

impl SegmentBatch {
    /// Creates a new, empty batch with the given column capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            event_id: Vec::with_capacity(capacity),
            x_start: Vec::with_capacity(capacity),
            y_start: Vec::with_capacity(capacity),
            z_start: Vec::with_capacity(capacity),
            x_end: Vec::with_capacity(capacity),
            y_end: Vec::with_capacity(capacity),
            z_end: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            t_start: Vec::with_capacity(capacity),
            t_end: Vec::with_capacity(capacity),
            t: Vec::with_capacity(capacity),
            t0_start: Vec::with_capacity(capacity),
            t0_end: Vec::with_capacity(capacity),
            t0: Vec::with_capacity(capacity),
            d_e: Vec::with_capacity(capacity),
            d_e_dx: Vec::with_capacity(capacity),
            n_electrons: Vec::with_capacity(capacity),
            long_diff: Vec::with_capacity(capacity),
            tran_diff: Vec::with_capacity(capacity),
            pixel_plane: Vec::with_capacity(capacity),
            n_photons: Vec::with_capacity(capacity),
        }
    }

    /// Builds a batch from a slice of records, in order.
    #[must_use]
    pub fn from_records(records: &[SegmentRecord]) -> Self {
        let mut batch = Self::with_capacity(records.len());
        for r in records {
            batch.push(*r);
        }
        batch
    }

    /// Number of segments in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True if the batch holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Appends one record's columns to the batch.
    pub fn push(&mut self, r: SegmentRecord) {
        self.event_id.push(r.event_id);
        self.x_start.push(r.x_start);
        self.y_start.push(r.y_start);
        self.z_start.push(r.z_start);
        self.x_end.push(r.x_end);
        self.y_end.push(r.y_end);
        self.z_end.push(r.z_end);
        self.x.push(r.x);
        self.y.push(r.y);
        self.z.push(r.z);
        self.t_start.push(r.t_start);
        self.t_end.push(r.t_end);
        self.t.push(r.t);
        self.t0_start.push(r.t0_start);
        self.t0_end.push(r.t0_end);
        self.t0.push(r.t0);
        self.d_e.push(r.d_e);
        self.d_e_dx.push(r.d_e_dx);
        self.n_electrons.push(r.n_electrons);
        self.long_diff.push(r.long_diff);
        self.tran_diff.push(r.tran_diff);
        self.pixel_plane.push(r.pixel_plane);
        self.n_photons.push(r.n_photons.unwrap_or(0.0));
    }

    /// Reconstructs a single record (AoS view) at `index`.
    #[must_use]
    pub fn record(&self, index: usize) -> SegmentRecord {
        SegmentRecord {
            event_id: self.event_id[index],
            x_start: self.x_start[index],
            y_start: self.y_start[index],
            z_start: self.z_start[index],
            x_end: self.x_end[index],
            y_end: self.y_end[index],
            z_end: self.z_end[index],
            x: self.x[index],
            y: self.y[index],
            z: self.z[index],
            t_start: self.t_start[index],
            t_end: self.t_end[index],
            t: self.t[index],
            t0_start: self.t0_start[index],
            t0_end: self.t0_end[index],
            t0: self.t0[index],
            d_e: self.d_e[index],
            d_e_dx: self.d_e_dx[index],
            n_electrons: self.n_electrons[index],
            long_diff: self.long_diff[index],
            tran_diff: self.tran_diff[index],
            pixel_plane: self.pixel_plane[index],
            n_photons: Some(self.n_photons[index]),
        }
    }

    /// Returns the `[start, end)` row range of segments belonging to
    /// `event_id`, assuming the batch is event-contiguous (spec §6).
    #[must_use]
    pub fn event_range(&self, event_id: u64) -> Option<(usize, usize)> {
        let start = self.event_id.iter().position(|&e| e == event_id)?;
        let end = self.event_id[start..]
            .iter()
            .position(|&e| e != event_id)
            .map_or(self.event_id.len(), |offset| start + offset);
        Some((start, end))
    }
}
