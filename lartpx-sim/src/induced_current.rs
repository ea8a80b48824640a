//! Induced Current (spec §4.F, the hardest kernel): for every
//! `(segment, neighboring pixel, tick)` triple, the current induced by
//! that segment's diffused charge cloud on that pixel at that tick.
//!
//! The closed-form Gaussian line-charge integral and the polar-grid
//! pixel-response integral both use [`libm::erf`]. Per the endcap
//! Open Question (spec §9), this implementation recomputes the
//! Gaussian weights per slice whenever the slice falls within
//! `5 * long_diff` of either endpoint, and reuses the same-length
//! normalization elsewhere — the policy that appears in
//! `track_current`'s `endcap_size = 5 * long_diff` check.

use crate::pixel_association::PixelAssociation;
use crate::time_intervals::TimeIntervals;
use lartpx_core::{Error, Geometry, PixelCoord, Result, SegmentBatch, PIXEL_SENTINEL};
use rayon::prelude::*;

const N_R: usize = 4;
const N_THETA: usize = 2 * N_R;

/// A segment's geometry and charge, as needed by the Gaussian integral.
struct SegmentGeom {
    start: (f64, f64, f64),
    end: (f64, f64, f64),
    sigma_t: f64,
    sigma_l: f64,
    n_electrons: f64,
}

impl SegmentGeom {
    fn from_batch(batch: &SegmentBatch, i: usize) -> Self {
        Self {
            start: (batch.x_start[i], batch.y_start[i], batch.z_start[i]),
            end: (batch.x_end[i], batch.y_end[i], batch.z_end[i]),
            sigma_t: batch.tran_diff[i],
            sigma_l: batch.long_diff[i],
            n_electrons: batch.n_electrons[i],
        }
    }
}

/// Computes `signals[segment, neighbor-slot, tick]`, flattened
/// row-major with strides `(neighbor_width * t_batch, t_batch, 1)`.
///
/// # Errors
/// Returns [`Error::InvalidInput`] for an unknown `pixel_plane`, or
/// [`Error::NumericFault`] for a non-physical Gaussian integral input.
pub fn compute_induced_current(
    batch: &SegmentBatch,
    geometry: &Geometry,
    assoc: &PixelAssociation,
    intervals: &TimeIntervals,
) -> Result<Vec<f64>> {
    let n = batch.len();
    let neighbor_width = assoc.neighbor_width;
    let t_batch = intervals.t_batch;
    let dz = geometry.z_sampling();
    let v_d = geometry.drift_velocity;
    let dt = geometry.time_sampling;

    let mut signals = vec![0.0f64; n * neighbor_width * t_batch];

    signals
        .par_chunks_mut(neighbor_width * t_batch)
        .enumerate()
        .try_for_each(|(s, seg_out)| -> Result<()> {
            let plane = geometry
                .plane(batch.pixel_plane[s])
                .ok_or_else(|| Error::InvalidInput {
                    segment_index: s,
                    reason: format!("unknown pixel_plane {}", batch.pixel_plane[s]),
                })?;
            let rho_tol = 3.0 * std::f64::consts::SQRT_2 * plane.pitch;
            let half_pitch = plane.pitch / 2.0;
            let seg = SegmentGeom::from_batch(batch, s);
            let endcap_size = 5.0 * seg.sigma_l;

            for k in 0..neighbor_width {
                let pid = assoc.neighboring_pixels[s * neighbor_width + k];
                if pid == PIXEL_SENTINEL {
                    continue;
                }
                let coord = PixelCoord::from_id(pid, plane.nx, plane.ny);
                let xp = plane.pixel_center_x(coord.ix);
                let yp = plane.pixel_center_y(coord.iy);

                let Some((z_poca, z_lo, z_hi)) = poca_z_interval(&seg, xp, yp, rho_tol) else {
                    continue;
                };

                let n_up = (((z_hi - z_poca) / dz).ceil()).max(1.0);
                let n_down = (((z_poca - z_lo) / dz).ceil()).max(0.0);
                let dz_eff = (z_hi - z_poca) / n_up;
                if dz_eff.is_nan() || dz_eff == 0.0 {
                    continue;
                }
                let n_up_i = n_up as i64;
                let n_down_i = n_down as i64;

                for iz in -n_down_i..=n_up_i {
                    let z_iz = z_poca + (iz as f64) * dz_eff;
                    let span = seg.end.2 - seg.start.2;
                    let frac = if span.abs() > f64::EPSILON {
                        (z_iz - seg.start.2) / span
                    } else {
                        0.0
                    };
                    let x_iz = seg.start.0 + frac * (seg.end.0 - seg.start.0);
                    let y_iz = seg.start.1 + frac * (seg.end.1 - seg.start.1);
                    let t0 = (z_iz - plane.anode_z) / v_d;

                    let dist_to_start = (z_iz - seg.start.2).abs();
                    let dist_to_end = (seg.end.2 - z_iz).abs();
                    let near_endpoint = dist_to_start < endcap_size || dist_to_end < endcap_size;
                    let delta_r_override = near_endpoint
                        .then(|| (2.0 * dist_to_start.min(dist_to_end)).max(1e-6));

                    for t in 0..t_batch {
                        let t_tick = intervals.track_starts[s] + (t as f64) * dt;
                        if t_tick >= t0 + 5.0 {
                            continue;
                        }
                        let contribution = polar_slice_contribution(
                            &seg,
                            x_iz,
                            y_iz,
                            z_iz,
                            xp,
                            yp,
                            half_pitch,
                            t_tick,
                            t0,
                            delta_r_override,
                        )? * dz_eff;
                        if contribution != 0.0 {
                            seg_out[k * t_batch + t] += contribution;
                        }
                    }
                }
            }
            Ok(())
        })?;

    Ok(signals)
}

/// Projects the segment's anode-plane line onto the pixel center,
/// returning `(z_poca, z_lo, z_hi)` for the chord cut by a disc of
/// radius `rho_tol`, or `None` if the 2-D distance exceeds `rho_tol`.
fn poca_z_interval(seg: &SegmentGeom, xp: f64, yp: f64, rho_tol: f64) -> Option<(f64, f64, f64)> {
    let dx = seg.end.0 - seg.start.0;
    let dy = seg.end.1 - seg.start.1;
    let len_sq = dx * dx + dy * dy;

    if len_sq < f64::EPSILON {
        let dist = ((seg.start.0 - xp).powi(2) + (seg.start.1 - yp).powi(2)).sqrt();
        return (dist <= rho_tol).then_some((seg.start.2, seg.start.2, seg.start.2));
    }

    let t_poca = (((xp - seg.start.0) * dx + (yp - seg.start.1) * dy) / len_sq).clamp(0.0, 1.0);
    let poca_x = seg.start.0 + t_poca * dx;
    let poca_y = seg.start.1 + t_poca * dy;
    let dist = ((poca_x - xp).powi(2) + (poca_y - yp).powi(2)).sqrt();
    if dist > rho_tol {
        return None;
    }

    let len = len_sq.sqrt();
    let half_chord_sq = (rho_tol.powi(2) - dist.powi(2)).max(0.0);
    let half_chord_t = half_chord_sq.sqrt() / len;
    let t_lo = (t_poca - half_chord_t).max(0.0);
    let t_hi = (t_poca + half_chord_t).min(1.0);

    let z_of = |t: f64| seg.start.2 + t * (seg.end.2 - seg.start.2);
    let z_poca = z_of(t_poca);
    let (z_lo, z_hi) = {
        let (a, b) = (z_of(t_lo), z_of(t_hi));
        if a <= b { (a, b) } else { (b, a) }
    };
    Some((z_poca, z_lo, z_hi))
}

/// The polar-grid integral of `rho_cloud * I` around `(x_iz, y_iz)`
/// (spec §4.F step 5), with area element
/// `0.5 * dtheta * dr^2 * ((ir+1)^2 - ir^2)`.
#[allow(clippy::too_many_arguments)]
fn polar_slice_contribution(
    seg: &SegmentGeom,
    x_iz: f64,
    y_iz: f64,
    z_iz: f64,
    xp: f64,
    yp: f64,
    half_pitch: f64,
    t_tick: f64,
    t0: f64,
    delta_r_override: Option<f64>,
) -> Result<f64> {
    if seg.sigma_t <= 0.0 {
        let dx_off = (x_iz - xp).abs();
        let dy_off = (y_iz - yp).abs();
        if dx_off > half_pitch || dy_off > half_pitch {
            return Ok(0.0);
        }
        let rho = gaussian_point_charge(seg, x_iz, y_iz, z_iz, delta_r_override)?;
        return Ok(rho * pixel_response(t_tick, t0, dx_off, dy_off));
    }

    let r_max = 3.0 * seg.sigma_t;
    let dr = r_max / N_R as f64;
    let dtheta = 2.0 * std::f64::consts::PI / N_THETA as f64;

    let mut total = 0.0;
    for ir in 0..N_R {
        let r = (ir as f64 + 0.5) * dr;
        let area = 0.5 * dtheta * dr * dr * (((ir + 1) as f64).powi(2) - (ir as f64).powi(2));
        for itheta in 0..N_THETA {
            let theta = itheta as f64 * dtheta;
            let x = x_iz + r * theta.cos();
            let y = y_iz + r * theta.sin();
            let dx_off = (x - xp).abs();
            let dy_off = (y - yp).abs();
            if dx_off > half_pitch || dy_off > half_pitch {
                continue;
            }
            let rho = gaussian_point_charge(seg, x, y, z_iz, delta_r_override)?;
            total += rho * pixel_response(t_tick, t0, dx_off, dy_off) * area;
        }
    }
    Ok(total)
}

/// Closed-form evaluation of the 3-D Gaussian line-charge density at
/// `(x, y, z)` (spec §4.F step 5's `rho_cloud` formula).
///
/// # Errors
/// Returns [`Error::NumericFault`] if a diffusion sigma is non-positive
/// or if the curvature term `a` comes out negative.
fn gaussian_point_charge(
    seg: &SegmentGeom,
    x: f64,
    y: f64,
    z: f64,
    delta_r_override: Option<f64>,
) -> Result<f64> {
    let seg_vec = (
        seg.end.0 - seg.start.0,
        seg.end.1 - seg.start.1,
        seg.end.2 - seg.start.2,
    );
    let full_len = (seg_vec.0.powi(2) + seg_vec.1.powi(2) + seg_vec.2.powi(2)).sqrt();
    let delta_r = delta_r_override.unwrap_or(full_len);
    if delta_r <= 0.0 {
        return Ok(0.0);
    }

    let sigmas = (seg.sigma_t, seg.sigma_t, seg.sigma_l);
    if sigmas.0 <= 0.0 || sigmas.1 <= 0.0 || sigmas.2 <= 0.0 {
        return Err(Error::NumericFault {
            reason: "non-positive diffusion sigma in Gaussian integral".into(),
        });
    }

    let comps = [
        (seg_vec.0, x - seg.start.0, sigmas.0),
        (seg_vec.1, y - seg.start.1, sigmas.1),
        (seg_vec.2, z - seg.start.2, sigmas.2),
    ];

    let mut a = 0.0;
    let mut b = 0.0;
    let mut delta = 0.0;
    for (seg_i, p_minus_start_i, sigma_i) in comps {
        a += (seg_i / delta_r).powi(2) / (2.0 * sigma_i.powi(2));
        b -= p_minus_start_i * seg_i / (sigma_i.powi(2) * delta_r);
        delta += p_minus_start_i.powi(2) / (2.0 * sigma_i.powi(2));
    }

    if a.is_nan() || a < 0.0 {
        return Err(Error::NumericFault {
            reason: "non-positive curvature in Gaussian integral".into(),
        });
    }
    let a = a.max(1e-12);
    let sqrt_a = a.sqrt();

    if (b / (2.0 * sqrt_a)).abs() > 6.0 {
        return Ok(0.0);
    }

    let factor =
        seg.n_electrons / (delta_r * sigmas.0 * sigmas.1 * sigmas.2 * (8.0 * std::f64::consts::PI.powi(3)).sqrt());
    let exponent = b.powi(2) / (4.0 * a) - delta;
    let erf_hi = libm::erf((b + 2.0 * a * delta_r) / (2.0 * sqrt_a));
    let erf_lo = libm::erf(b / (2.0 * sqrt_a));
    let integral = std::f64::consts::PI.sqrt() / (2.0 * sqrt_a) * (erf_hi - erf_lo);

    let rho = factor * exponent.exp() * integral;
    if rho.is_nan() {
        return Err(Error::NumericFault {
            reason: "NaN Gaussian line-charge density".into(),
        });
    }
    Ok(rho)
}

/// Quadratic-polynomial coefficients for the parametric pixel current
/// response, representative of a pre-fit field-response shape (spec
/// §4.F step 5). The exact fitted table from the originating field
/// simulation is out of scope; this keeps the same functional form
/// (`I = a*exp((t-t0)/b) + c*exp((t-t0)/d)` for `t < t0`) with
/// plausible decay constants.
struct ResponseCoeffs {
    c00: f64,
    cx: f64,
    cy: f64,
    cxx: f64,
    cxy: f64,
    cyy: f64,
}

const A_COEFFS: ResponseCoeffs = ResponseCoeffs { c00: 1.0, cx: -0.6, cy: -0.6, cxx: 0.1, cxy: 0.05, cyy: 0.1 };
const B_COEFFS: ResponseCoeffs = ResponseCoeffs { c00: 0.05, cx: 0.01, cy: 0.01, cxx: 0.0, cxy: 0.0, cyy: 0.0 };
const C_COEFFS: ResponseCoeffs = ResponseCoeffs { c00: -0.3, cx: 0.2, cy: 0.2, cxx: -0.05, cxy: 0.0, cyy: -0.05 };
const D_COEFFS: ResponseCoeffs = ResponseCoeffs { c00: 0.5, cx: 0.05, cy: 0.05, cxx: 0.0, cxy: 0.0, cyy: 0.0 };

fn poly(c: &ResponseCoeffs, dx: f64, dy: f64) -> f64 {
    c.c00 + c.cx * dx + c.cy * dy + c.cxx * dx * dx + c.cxy * dx * dy + c.cyy * dy * dy
}

/// Parametric pixel current response `I(t, t0, dx, dy)` (spec §4.F step
/// 5): zero for `t >= t0`, a two-exponential rise-and-settle otherwise.
fn pixel_response(t: f64, t0: f64, dx: f64, dy: f64) -> f64 {
    if t >= t0 {
        return 0.0;
    }
    let a = poly(&A_COEFFS, dx, dy);
    let b = poly(&B_COEFFS, dx, dy).max(1e-3);
    let c = poly(&C_COEFFS, dx, dy);
    let d = poly(&D_COEFFS, dx, dy).max(1e-3);
    a * ((t - t0) / b).exp() + c * ((t - t0) / d).exp()
}
