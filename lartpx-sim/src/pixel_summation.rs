//! Pixel Summation (spec §4.G): scatter-adds per-segment currents onto
//! a dense `(unique pixel, time tick)` grid, preserving the
//! per-contributing-segment breakdown for MC truth.
//!
//! Stable Rust has no atomic `f64`; this uses the equivalent
//! "accumulate into thread-local buffers, then tree-reduce" shape of a
//! `rayon` parallel reduction instead of literal `atomic_add`, the same
//! trick a grid-clustering kernel plays with `AtomicUsize` unions.

use crate::pixel_association::PixelAssociation;
use crate::time_intervals::TimeIntervals;
use crate::TRACK_SLOTS;
use lartpx_core::{SegmentBatch, PIXEL_SENTINEL};
use rayon::prelude::*;

/// Summed current per unique pixel, plus the per-contributing-segment
/// breakdown needed for MC truth.
pub struct PixelSummation {
    /// Sorted, deduplicated pixel IDs touched by this batch.
    pub unique_pixels: Vec<i64>,
    /// `segment * neighbor_width + slot -> index into unique_pixels`, or `-1`.
    pub pixel_index_map: Vec<i64>,
    /// `unique_pixel * TRACK_SLOTS + slot -> segment index`, `-1` padded.
    pub track_pixel_map: Vec<i64>,
    /// `unique_pixel * t_tot + tick -> summed current`.
    pub pixels_signals: Vec<f64>,
    /// `(unique_pixel * t_tot + tick) * TRACK_SLOTS + slot -> per-segment current`.
    pub pixels_tracks_signals: Vec<f64>,
    /// Length of the batch-wide absolute tick axis.
    pub t_tot: usize,
}

/// Summarizes per-segment induced current onto the unique-pixel grid.
#[must_use]
pub fn summarize_pixels(
    batch: &SegmentBatch,
    assoc: &PixelAssociation,
    intervals: &TimeIntervals,
    signals: &[f64],
    dt: f64,
) -> PixelSummation {
    let n = batch.len();
    let neighbor_width = assoc.neighbor_width;
    let t_batch = intervals.t_batch;

    let mut unique: Vec<i64> = assoc
        .neighboring_pixels
        .iter()
        .copied()
        .filter(|&id| id != PIXEL_SENTINEL)
        .collect();
    unique.sort_unstable();
    unique.dedup();
    let u_count = unique.len();

    let pixel_index_map: Vec<i64> = assoc
        .neighboring_pixels
        .iter()
        .map(|&id| {
            if id == PIXEL_SENTINEL {
                PIXEL_SENTINEL
            } else {
                unique.binary_search(&id).map_or(PIXEL_SENTINEL, |u| u as i64)
            }
        })
        .collect();

    let global_origin = intervals
        .track_starts
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let global_origin = if global_origin.is_finite() { global_origin } else { 0.0 };
    let offsets: Vec<usize> = intervals
        .track_starts
        .iter()
        .map(|&ts| (((ts - global_origin) / dt).round()).max(0.0) as usize)
        .collect();
    let t_tot = offsets.iter().map(|&o| o + t_batch).max().unwrap_or(t_batch).max(1);

    // track_pixel_map[u] fills via a separate pass over all neighboring
    // rows (spec §4.G), capped at TRACK_SLOTS per unique pixel.
    let mut track_pixel_map = vec![PIXEL_SENTINEL; u_count * TRACK_SLOTS];
    let mut slot_of = vec![-1i64; n * neighbor_width];
    for s in 0..n {
        for k in 0..neighbor_width {
            let u = pixel_index_map[s * neighbor_width + k];
            if u < 0 {
                continue;
            }
            let row = &mut track_pixel_map[u as usize * TRACK_SLOTS..(u as usize + 1) * TRACK_SLOTS];
            if let Some(pos) = row.iter().position(|&x| x == s as i64) {
                slot_of[s * neighbor_width + k] = pos as i64;
            } else if let Some(pos) = row.iter().position(|&x| x == PIXEL_SENTINEL) {
                row[pos] = s as i64;
                slot_of[s * neighbor_width + k] = pos as i64;
            }
            // else: this unique pixel's TRACK_SLOTS contributing-track
            // slots are full; the contribution still lands in
            // pixels_signals, just without a per-track breakdown.
        }
    }

    let (pixels_signals, pixels_tracks_signals) = (0..n)
        .into_par_iter()
        .fold(
            || (vec![0.0f64; u_count * t_tot], vec![0.0f64; u_count * t_tot * TRACK_SLOTS]),
            |mut acc, s| {
                let offset = offsets[s];
                for k in 0..neighbor_width {
                    let u = pixel_index_map[s * neighbor_width + k];
                    if u < 0 {
                        continue;
                    }
                    let u = u as usize;
                    let slot = slot_of[s * neighbor_width + k];
                    for t in 0..t_batch {
                        let val = signals[(s * neighbor_width + k) * t_batch + t];
                        if val == 0.0 {
                            continue;
                        }
                        let global_t = offset + t;
                        if global_t >= t_tot {
                            continue;
                        }
                        acc.0[u * t_tot + global_t] += val;
                        if slot >= 0 {
                            acc.1[(u * t_tot + global_t) * TRACK_SLOTS + slot as usize] += val;
                        }
                    }
                }
                acc
            },
        )
        .reduce(
            || (vec![0.0f64; u_count * t_tot], vec![0.0f64; u_count * t_tot * TRACK_SLOTS]),
            |mut a, b| {
                for (x, y) in a.0.iter_mut().zip(b.0) {
                    *x += y;
                }
                for (x, y) in a.1.iter_mut().zip(b.1) {
                    *x += y;
                }
                a
            },
        );

    PixelSummation {
        unique_pixels: unique,
        pixel_index_map,
        track_pixel_map,
        pixels_signals,
        pixels_tracks_signals,
        t_tot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_intervals::compute_time_intervals;
    use crate::{drifting, pixel_association::associate_pixels, quenching};
    use lartpx_core::{ElectronicsConfig, GeometryConfig, PhysicsConfig, SegmentRecord};

    fn geometry() -> lartpx_core::Geometry {
        lartpx_core::Geometry::from_configs(
            &GeometryConfig::default(),
            PhysicsConfig::default(),
            ElectronicsConfig::default(),
        )
        .unwrap()
    }

    fn segment() -> SegmentRecord {
        SegmentRecord {
            event_id: 0,
            x_start: 0.0,
            y_start: 0.0,
            z_start: 10.0,
            x_end: 0.0,
            y_end: 0.0,
            z_end: 11.0,
            x: 0.0,
            y: 0.0,
            z: 10.5,
            t_start: 0.0,
            t_end: 0.0,
            t: 0.0,
            t0_start: 0.0,
            t0_end: 0.0,
            t0: 0.0,
            d_e: 1.0,
            d_e_dx: 2.0,
            n_electrons: 0.0,
            long_diff: 0.0,
            tran_diff: 0.0,
            pixel_plane: 0,
            n_photons: None,
        }
    }

    #[test]
    fn pixel_index_map_matches_sentinel_padding() {
        let geom = geometry();
        let mut batch = lartpx_core::SegmentBatch::from_records(&[segment()]);
        quenching::quench(&mut batch, &geom.physics).unwrap();
        drifting::drift(&mut batch, &geom).unwrap();
        let assoc = associate_pixels(&batch, &geom, 8).unwrap();
        let intervals = compute_time_intervals(&batch, &geom);
        let signals = vec![0.0; batch.len() * assoc.neighbor_width * intervals.t_batch];
        let summary = summarize_pixels(&batch, &assoc, &intervals, &signals, geom.time_sampling);

        for (idx, &id) in assoc.neighboring_pixels.iter().enumerate() {
            if id == PIXEL_SENTINEL {
                assert_eq!(summary.pixel_index_map[idx], PIXEL_SENTINEL);
            } else {
                assert!(summary.pixel_index_map[idx] >= 0);
            }
        }
    }
}
