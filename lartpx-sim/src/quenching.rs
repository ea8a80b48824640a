//! Quenching (spec §4.B): converts deposited energy into a number of
//! ionization electrons per segment via Box or Birks recombination.
//! Parallel over segments; no inter-segment dependency.

use lartpx_core::{Error, PhysicsConfig, QuenchingModel, Result, SegmentBatch};
use rayon::prelude::*;

/// Applies recombination to every segment in the batch, filling
/// `n_electrons`. Idempotent: re-running this on an already-quenched
/// batch recomputes the same values from `d_e`/`d_e_dx`, unaffected by
/// the previous `n_electrons` (spec invariant 5).
///
/// # Errors
/// Returns [`Error::NumericFault`] if any recombination factor is NaN.
pub fn quench(batch: &mut SegmentBatch, physics: &PhysicsConfig) -> Result<()> {
    let model = physics.quenching_model;
    let computed: Vec<f64> = (0..batch.len())
        .into_par_iter()
        .map(|i| electrons_for_segment(batch.d_e[i], batch.d_e_dx[i], model, physics, i))
        .collect::<Result<Vec<_>>>()?;
    batch.n_electrons = computed;
    Ok(())
}

fn recombination_factor(model: QuenchingModel, de_dx: f64, physics: &PhysicsConfig) -> f64 {
    match model {
        QuenchingModel::Box => {
            let xi = physics.box_beta * de_dx / (physics.e_field * physics.lar_density);
            let r = if xi.abs() < 1e-12 {
                // L'Hopital limit of ln(alpha + xi)/xi as xi -> 0.
                1.0 / physics.box_alpha
            } else {
                (physics.box_alpha + xi).ln() / xi
            };
            r.max(0.0)
        }
        QuenchingModel::Birks => {
            physics.birks_ab
                / (1.0 + physics.birks_kb * de_dx / (physics.e_field * physics.lar_density))
        }
    }
}

fn electrons_for_segment(
    d_e: f64,
    d_e_dx: f64,
    model: QuenchingModel,
    physics: &PhysicsConfig,
    segment_index: usize,
) -> Result<f64> {
    let r = recombination_factor(model, d_e_dx, physics);
    if r.is_nan() {
        return Err(Error::NumericFault {
            reason: format!("NaN recombination factor at segment {segment_index}"),
        });
    }
    Ok(r * d_e * physics.mev_to_electrons())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lartpx_core::SegmentRecord;

    fn segment(d_e: f64, d_e_dx: f64) -> SegmentRecord {
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
            d_e,
            d_e_dx,
            n_electrons: 0.0,
            long_diff: 0.0,
            tran_diff: 0.0,
            pixel_plane: 0,
            n_photons: None,
        }
    }

    #[test]
    fn n_electrons_is_nonnegative() {
        let mut batch = SegmentBatch::from_records(&[segment(1.0, 2.0), segment(0.5, 50.0)]);
        quench(&mut batch, &PhysicsConfig::default()).unwrap();
        assert!(batch.n_electrons.iter().all(|&n| n >= 0.0));
    }

    #[test]
    fn matches_birks_scenario_s1() {
        // S1: dE = 1 MeV, dEdx = 2 MeV/cm, Birks on.
        let mut batch = SegmentBatch::from_records(&[segment(1.0, 2.0)]);
        let physics = PhysicsConfig::default();
        quench(&mut batch, &physics).unwrap();
        let r = physics.birks_ab / (1.0 + physics.birks_kb * 2.0 / (physics.e_field * physics.lar_density));
        let expected = r * 1.0 * physics.mev_to_electrons();
        assert_relative_eq!(batch.n_electrons[0], expected, max_relative = 1e-9);
    }

    #[test]
    fn quenching_is_idempotent() {
        let mut batch = SegmentBatch::from_records(&[segment(1.0, 2.0)]);
        let physics = PhysicsConfig::default();
        quench(&mut batch, &physics).unwrap();
        let first = batch.n_electrons.clone();
        quench(&mut batch, &physics).unwrap();
        assert_eq!(first, batch.n_electrons);
    }

    #[test]
    fn box_model_zero_de_dx_does_not_fault() {
        let mut batch = SegmentBatch::from_records(&[segment(1.0, 0.0)]);
        let mut physics = PhysicsConfig::default();
        physics.quenching_model = QuenchingModel::Box;
        assert!(quench(&mut batch, &physics).is_ok());
        assert!(batch.n_electrons[0].is_finite());
    }
}
