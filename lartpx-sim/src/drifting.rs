//! Drifting (spec §4.C): transports each segment to the anode, computing
//! drift time, lifetime attenuation, diffusion sigmas, and anode-arrival
//! times. Parallel over segments.
//!
//! Only the segment midpoint's drift coordinate collapses to the anode
//! z; `z_start`/`z_end` keep their original extent, since the induced
//! current stage still needs a non-degenerate 3-D direction vector for
//! the Gaussian line-charge integral. This mirrors the original
//! `Drifting.forward` transform, which reassigns only the midpoint `z`
//! column.

use lartpx_core::{Error, Geometry, Result, SegmentBatch};
use rayon::prelude::*;

struct Drifted {
    anode_z: f64,
    n_electrons: f64,
    long_diff: f64,
    tran_diff: f64,
    t: f64,
    t_start: f64,
    t_end: f64,
}

/// Drifts every segment in the batch to its plane's anode.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if a segment names an unknown
/// `pixel_plane`, or [`Error::NumericFault`] if a diffusion sigma comes
/// out NaN.
pub fn drift(batch: &mut SegmentBatch, geometry: &Geometry) -> Result<()> {
    let v_d = geometry.drift_velocity;
    let results: Vec<Drifted> = (0..batch.len())
        .into_par_iter()
        .map(|i| drift_segment(batch, geometry, v_d, i))
        .collect::<Result<Vec<_>>>()?;

    for (i, d) in results.into_iter().enumerate() {
        batch.z[i] = d.anode_z;
        batch.n_electrons[i] = d.n_electrons;
        batch.long_diff[i] = d.long_diff;
        batch.tran_diff[i] = d.tran_diff;
        batch.t[i] = d.t;
        batch.t_start[i] = d.t_start;
        batch.t_end[i] = d.t_end;
    }
    Ok(())
}

fn drift_segment(batch: &SegmentBatch, geometry: &Geometry, v_d: f64, i: usize) -> Result<Drifted> {
    let plane = geometry
        .plane(batch.pixel_plane[i])
        .ok_or_else(|| Error::InvalidInput {
            segment_index: i,
            reason: format!("unknown pixel_plane {}", batch.pixel_plane[i]),
        })?;
    let anode_z = plane.anode_z;

    let drift_dist = (batch.z[i] - anode_z).abs();
    let drift_dist_start = (batch.z_start[i] - anode_z).abs();
    let drift_dist_end = (batch.z_end[i] - anode_z).abs();

    let drift_time = drift_dist / v_d;
    let drift_time_start = drift_dist_start / v_d;
    let drift_time_end = drift_dist_end / v_d;

    let attenuation = match geometry.electron_lifetime {
        Some(tau) if tau.is_finite() && tau > 0.0 => (-drift_time / tau).exp(),
        _ => 1.0,
    };
    let n_electrons = batch.n_electrons[i] * attenuation;

    let long_diff = (2.0 * geometry.longitudinal_diffusion * drift_time).sqrt();
    let tran_diff = (2.0 * geometry.transverse_diffusion * drift_time).sqrt();
    if long_diff.is_nan() || tran_diff.is_nan() {
        return Err(Error::NumericFault {
            reason: format!("NaN diffusion sigma at segment {i}"),
        });
    }

    let t = batch.t[i] + drift_time + tran_diff / v_d;
    let t_start = batch.t_start[i] + drift_time_start + tran_diff / v_d;
    let t_end = batch.t_end[i] + drift_time_end + tran_diff / v_d;

    Ok(Drifted {
        anode_z,
        n_electrons,
        long_diff,
        tran_diff,
        t,
        t_start,
        t_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lartpx_core::{GeometryConfig, PhysicsConfig, SegmentRecord};

    fn segment(z: f64) -> SegmentRecord {
        SegmentRecord {
            event_id: 0,
            x_start: 0.0,
            y_start: 0.0,
            z_start: z,
            x_end: 0.0,
            y_end: 0.0,
            z_end: z,
            x: 0.0,
            y: 0.0,
            z,
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
            tran_diff: 0.0,
            pixel_plane: 0,
            n_photons: None,
        }
    }

    fn geometry() -> Geometry {
        Geometry::from_configs(
            &GeometryConfig::default(),
            PhysicsConfig::default(),
            lartpx_core::ElectronicsConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn farther_segments_lose_more_charge_and_diffuse_more() {
        let geom = geometry();
        let mut near = SegmentBatch::from_records(&[segment(5.0)]);
        let mut far = SegmentBatch::from_records(&[segment(25.0)]);
        drift(&mut near, &geom).unwrap();
        drift(&mut far, &geom).unwrap();

        assert!(far.n_electrons[0] < near.n_electrons[0]);
        assert!(far.long_diff[0] > near.long_diff[0]);
        assert!(far.tran_diff[0] > near.tran_diff[0]);
    }

    #[test]
    fn midpoint_collapses_to_anode() {
        let geom = geometry();
        let mut batch = SegmentBatch::from_records(&[segment(12.0)]);
        drift(&mut batch, &geom).unwrap();
        assert_eq!(batch.z[0], geom.planes[0].anode_z);
    }

    #[test]
    fn unknown_plane_is_invalid_input() {
        let geom = geometry();
        let mut record = segment(5.0);
        record.pixel_plane = 7;
        let mut batch = SegmentBatch::from_records(&[record]);
        assert!(matches!(drift(&mut batch, &geom), Err(Error::InvalidInput { .. })));
    }
}
