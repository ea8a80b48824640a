//! Time-Intervals (spec §4.E): per segment, rounds the signal window to
//! the sampling grid and reduces the batch-wide signal length via an
//! atomic max.

use lartpx_core::{Geometry, SegmentBatch};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-segment signal-window starts and the batch-wide tick-axis length.
pub struct TimeIntervals {
    /// Each segment's signal window start, rounded down to the sample
    /// grid (µs).
    pub track_starts: Vec<f64>,
    /// Shared tick-axis length (`T_batch`) across the whole batch.
    pub t_batch: usize,
}

/// Computes rounded signal windows and the batch-wide tick count.
#[must_use]
pub fn compute_time_intervals(batch: &SegmentBatch, geometry: &Geometry) -> TimeIntervals {
    let dt = geometry.time_sampling;
    let pad = geometry.time_padding;
    let n = batch.len();

    let track_starts: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| (((batch.t_start[i] - pad) / dt).floor()) * dt)
        .collect();

    let t_batch = AtomicUsize::new(0);
    (0..n).into_par_iter().for_each(|i| {
        let t_end_round = (((batch.t_end[i] + pad) / dt).ceil()) * dt;
        let length = (((t_end_round - track_starts[i]) / dt).round() as i64 + 1).max(0) as usize;
        t_batch.fetch_max(length, Ordering::Relaxed);
    });

    TimeIntervals {
        track_starts,
        t_batch: t_batch.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lartpx_core::{ElectronicsConfig, GeometryConfig, PhysicsConfig, SegmentRecord};

    fn geometry() -> Geometry {
        Geometry::from_configs(
            &GeometryConfig::default(),
            PhysicsConfig::default(),
            ElectronicsConfig::default(),
        )
        .unwrap()
    }

    fn segment(t_start: f64, t_end: f64) -> SegmentRecord {
        SegmentRecord {
            event_id: 0,
            x_start: 0.0,
            y_start: 0.0,
            z_start: 0.0,
            x_end: 0.0,
            y_end: 0.0,
            z_end: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            t_start,
            t_end,
            t: (t_start + t_end) / 2.0,
            t0_start: t_start,
            t0_end: t_end,
            t0: 0.0,
            d_e: 1.0,
            d_e_dx: 2.0,
            n_electrons: 1000.0,
            long_diff: 0.0,
            tran_diff: 0.0,
            pixel_plane: 0,
            n_photons: None,
        }
    }

    #[test]
    fn t_batch_reflects_longest_window() {
        let geom = geometry();
        let batch = SegmentBatch::from_records(&[segment(0.0, 1.0), segment(0.0, 50.0)]);
        let intervals = compute_time_intervals(&batch, &geom);
        assert!(intervals.t_batch > 10);
        assert_eq!(intervals.track_starts.len(), 2);
    }

    #[test]
    fn track_start_is_rounded_down_with_padding() {
        let geom = geometry();
        let batch = SegmentBatch::from_records(&[segment(5.0, 6.0)]);
        let intervals = compute_time_intervals(&batch, &geom);
        let dt = geom.time_sampling;
        let pad = geom.time_padding;
        let expected = (((5.0 - pad) / dt).floor()) * dt;
        assert_eq!(intervals.track_starts[0], expected);
    }
}
