//! Pixel Association (spec §4.D): for each segment, the active pixels
//! its anode projection crosses (4-connected Bresenham) and their
//! Chebyshev-radius neighborhood.
//!
//! Allocation follows the two-stage pattern from spec §9's Design
//! Notes: a cheap pass finds the per-batch maximum row width, then a
//! rectangular buffer is allocated with `-1` padding. `Pmax` may be
//! capped by the caller (`pmax_bound`); segments that would overflow
//! the bound surface [`Error::CapacityExceeded`] so the orchestrator can
//! double the bound and retry the batch.

use lartpx_core::{Error, Geometry, PixelCoord, Result, SegmentBatch, PIXEL_SENTINEL};
use rayon::prelude::*;
use std::collections::HashSet;

/// Dense, rectangular pixel-association buffers for one batch (spec §3).
#[derive(Debug)]
pub struct PixelAssociation {
    /// Row width of `active_pixels`.
    pub pmax: usize,
    /// `segment * pmax + slot -> pixel id`, `-1` padded.
    pub active_pixels: Vec<i64>,
    /// Chebyshev neighborhood radius used for this batch.
    pub radius: i32,
    /// Row width of `neighboring_pixels`, `(2r+1)^2 * pmax`.
    pub neighbor_width: usize,
    /// `segment * neighbor_width + slot -> pixel id`, `-1` padded.
    pub neighboring_pixels: Vec<i64>,
}

/// Associates pixels for every segment in the batch.
///
/// # Errors
/// Returns [`Error::InvalidInput`] for an unknown `pixel_plane`, or
/// [`Error::CapacityExceeded`] if any segment's active-pixel row would
/// exceed `pmax_bound`.
pub fn associate_pixels(
    batch: &SegmentBatch,
    geometry: &Geometry,
    pmax_bound: usize,
) -> Result<PixelAssociation> {
    let n = batch.len();
    let active_rows: Vec<Vec<i64>> = (0..n)
        .into_par_iter()
        .map(|i| active_pixels_for_segment(batch, geometry, i))
        .collect::<Result<Vec<_>>>()?;

    if let Some(row) = active_rows.iter().find(|row| row.len() > pmax_bound) {
        return Err(Error::CapacityExceeded {
            kind: lartpx_core::CapacityKind::ActivePixels,
            needed: row.len(),
            have: pmax_bound,
        });
    }

    let pmax = pmax_bound.max(1);
    let mut active_pixels = vec![PIXEL_SENTINEL; n * pmax];
    for (i, row) in active_rows.iter().enumerate() {
        for (k, &id) in row.iter().enumerate() {
            active_pixels[i * pmax + k] = id;
        }
    }

    let tran_diff_max = batch.tran_diff.iter().copied().fold(0.0_f64, f64::max);
    let pitch = geometry.planes.first().map_or(1.0, |p| p.pitch);
    let radius = ((5.0 * tran_diff_max / pitch).ceil() as i32).max(0);
    let side = (2 * radius + 1) as usize;
    let neighbor_width = side * side * pmax;

    let mut neighboring_pixels = vec![PIXEL_SENTINEL; n * neighbor_width];
    neighboring_pixels
        .par_chunks_mut(neighbor_width)
        .enumerate()
        .for_each(|(i, row_out)| {
            let Some(plane) = geometry.plane(batch.pixel_plane[i]) else {
                return;
            };
            let mut seen = HashSet::new();
            let mut idx = 0usize;
            for k in 0..pmax {
                let id = active_pixels[i * pmax + k];
                if id == PIXEL_SENTINEL {
                    continue;
                }
                let coord = PixelCoord::from_id(id, plane.nx, plane.ny);
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let nb = PixelCoord::new(coord.ix + dx, coord.iy + dy, coord.plane);
                        if !nb.in_bounds(plane.nx, plane.ny) {
                            continue;
                        }
                        let nid = nb.to_id(plane.nx, plane.ny);
                        if seen.insert(nid) && idx < row_out.len() {
                            row_out[idx] = nid;
                            idx += 1;
                        }
                    }
                }
            }
        });

    Ok(PixelAssociation {
        pmax,
        active_pixels,
        radius,
        neighbor_width,
        neighboring_pixels,
    })
}

fn active_pixels_for_segment(batch: &SegmentBatch, geometry: &Geometry, i: usize) -> Result<Vec<i64>> {
    let plane = geometry
        .plane(batch.pixel_plane[i])
        .ok_or_else(|| Error::InvalidInput {
            segment_index: i,
            reason: format!("unknown pixel_plane {}", batch.pixel_plane[i]),
        })?;
    let start = PixelCoord::new(
        plane.column_of(batch.x_start[i]),
        plane.row_of(batch.y_start[i]),
        batch.pixel_plane[i],
    );
    let end = PixelCoord::new(
        plane.column_of(batch.x_end[i]),
        plane.row_of(batch.y_end[i]),
        batch.pixel_plane[i],
    );

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for coord in bresenham_line(start, end) {
        if !coord.in_bounds(plane.nx, plane.ny) {
            continue;
        }
        let id = coord.to_id(plane.nx, plane.ny);
        if seen.insert(id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// Walks a 4-connected Bresenham line between two pixel coordinates on
/// the same plane, pushing the intermediate edge pixel on diagonal
/// steps so no two consecutive pixels are diagonal neighbors.
fn bresenham_line(start: PixelCoord, end: PixelCoord) -> Vec<PixelCoord> {
    let mut out = Vec::new();
    let (mut x, mut y) = (start.ix, start.iy);
    let (x1, y1) = (end.ix, end.iy);
    let dx = (x1 - x).abs();
    let dy = (y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    out.push(PixelCoord::new(x, y, start.plane));
    while x != x1 || y != y1 {
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
            out.push(PixelCoord::new(x, y, start.plane));
        }
        if e2 < dx {
            err += dx;
            y += sy;
            out.push(PixelCoord::new(x, y, start.plane));
        }
    }
    out
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

    fn segment(x_start: f64, x_end: f64) -> SegmentRecord {
        SegmentRecord {
            event_id: 0,
            x_start,
            y_start: 0.0,
            z_start: 0.0,
            x_end,
            y_end: 0.0,
            z_end: 0.0,
            x: (x_start + x_end) / 2.0,
            y: 0.0,
            z: 0.0,
            t_start: 0.0,
            t_end: 0.0,
            t: 0.0,
            t0_start: 0.0,
            t0_end: 0.0,
            t0: 0.0,
            d_e: 1.0,
            d_e_dx: 2.0,
            n_electrons: 1000.0,
            long_diff: 0.0,
            tran_diff: 0.2,
            pixel_plane: 0,
            n_photons: None,
        }
    }

    #[test]
    fn single_pixel_segment_has_one_active_slot() {
        let geom = geometry();
        let batch = SegmentBatch::from_records(&[segment(0.0, 0.01)]);
        let assoc = associate_pixels(&batch, &geom, 8).unwrap();
        assert_eq!(assoc.active_pixels.iter().filter(|&&id| id != PIXEL_SENTINEL).count(), 1);
    }

    #[test]
    fn bresenham_line_is_4_connected() {
        let a = PixelCoord::new(0, 0, 0);
        let b = PixelCoord::new(3, 2, 0);
        let path = bresenham_line(a, b);
        for pair in path.windows(2) {
            let d = pair[0].chebyshev_distance(pair[1]);
            let manhattan = (pair[0].ix - pair[1].ix).abs() + (pair[0].iy - pair[1].iy).abs();
            assert_eq!(d, 1);
            assert_eq!(manhattan, 1);
        }
    }

    #[test]
    fn exceeding_pmax_bound_is_capacity_exceeded() {
        let geom = geometry();
        // A long diagonal segment crosses many pixel columns.
        let batch = SegmentBatch::from_records(&[segment(-20.0, 20.0)]);
        let err = associate_pixels(&batch, &geom, 1).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
    }

    #[test]
    fn neighborhood_includes_pixel_beneath_midpoint() {
        let geom = geometry();
        let batch = SegmentBatch::from_records(&[segment(0.0, 0.01)]);
        let assoc = associate_pixels(&batch, &geom, 8).unwrap();
        let plane = &geom.planes[0];
        let coord = PixelCoord::new(plane.column_of(0.0), plane.row_of(0.0), 0);
        let id = coord.to_id(plane.nx, plane.ny);
        assert!(assoc.neighboring_pixels.contains(&id));
    }
}
