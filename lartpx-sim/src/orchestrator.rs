//! Orchestrator (spec §4.I): runs one chunk of segments through
//! D→E→F→G→H, accumulating ADC output and MC truth. The host-side
//! sequencing is single-threaded; each stage is a data-parallel bulk
//! kernel (spec §5).
//!
//! Each event's absolute start time advances from the last by a draw
//! from `Exp(1/EVENT_RATE)`, starting at zero for the first event seen
//! (spec §6); every front-end timestamp is offset by this value so
//! samples are stamped on an absolute, per-event clock rather than a
//! batch-local tick index.

use crate::frontend::FrontEnd;
use crate::{drifting, induced_current, pixel_association, pixel_summation, quenching, rng, time_intervals};
use crate::{MAX_CAPACITY_RETRIES, TRACK_SLOTS};
use lartpx_core::{AdcSample, CapacityKind, Error, Geometry, Result, SegmentBatch, TruthContribution};
use rand_distr::{Distribution, Exp};
use std::collections::HashMap;

/// Reserved `batch_index` coordinate for the per-event inter-arrival
/// RNG stream, kept disjoint from real batch indices (spec §6: absolute
/// timestamps require a per-event `event_start_time`).
const EVENT_TIME_STREAM: u64 = u64::MAX;

/// Digitization state carried across batches within a run: one
/// [`FrontEnd`] per pixel ID ever touched, plus accumulated output.
#[derive(Default)]
pub struct SimState {
    /// Global RNG seed for this run (spec §5, §9).
    pub global_seed: u64,
    /// Accumulated ADC samples across every batch processed so far.
    pub adc_samples: Vec<AdcSample>,
    /// Accumulated MC-truth attributions, indexed in step with
    /// `adc_samples` via each [`TruthContribution::sample_index`]
    /// offset by the sample count at the time it was emitted.
    pub truth: Vec<TruthContribution>,
    front_ends: HashMap<i64, FrontEnd>,
    initial_pmax_bound: usize,
    /// Each event's absolute start time, µs, keyed by `event_id`
    /// (spec §6). The first event processed starts at zero; every
    /// subsequent new event advances by a draw from `Exp(1/EVENT_RATE)`.
    event_start_times: HashMap<u64, f64>,
    /// Running total used to seed the next event's start time.
    next_event_start: f64,
}

impl SimState {
    /// Creates a fresh run state with the given global seed and initial
    /// active-pixel capacity guess.
    #[must_use]
    pub fn new(global_seed: u64, initial_pmax_bound: usize) -> Self {
        Self {
            global_seed,
            initial_pmax_bound: initial_pmax_bound.max(1),
            ..Self::default()
        }
    }

    /// Returns this event's absolute start time, µs, drawing and
    /// caching it on first use (spec §6).
    fn event_start_time(&mut self, event_id: u64, event_rate: f64) -> f64 {
        if let Some(&t) = self.event_start_times.get(&event_id) {
            return t;
        }
        let start = if self.event_start_times.is_empty() {
            0.0
        } else {
            let mut event_rng = rng::worker_rng(self.global_seed, event_id, EVENT_TIME_STREAM, 0);
            let gap = Exp::new(1.0 / event_rate.max(1e-9))
                .expect("event_rate must be positive")
                .sample(&mut event_rng);
            self.next_event_start + gap
        };
        self.event_start_times.insert(event_id, start);
        self.next_event_start = start;
        start
    }
}

/// Removes degenerate segments (zero anode-projection length and zero
/// drift) from `batch`, per spec §7's policy that they are reported and
/// skipped rather than failing the batch.
fn drop_degenerate(batch: &SegmentBatch) -> SegmentBatch {
    let keep: Vec<lartpx_core::SegmentRecord> = (0..batch.len())
        .map(|i| batch.record(i))
        .filter(|r| {
            let degenerate = r.is_degenerate();
            if degenerate {
                log::warn!("dropping degenerate segment");
            }
            !degenerate
        })
        .collect();
    SegmentBatch::from_records(&keep)
}

/// Runs one batch (chunk) of segments through the full pipeline,
/// retrying with a doubled active-pixel bound on
/// [`Error::CapacityExceeded`] (spec §7), up to [`MAX_CAPACITY_RETRIES`]
/// attempts.
///
/// # Errors
/// Returns [`Error::NumericFault`] if any stage produces a non-physical
/// value, or [`Error::InvalidInput`]/[`Error::InvalidConfig`] from
/// earlier validation, or [`Error::CapacityExceeded`] if the bound
/// still doesn't fit after retrying.
pub fn simulate_batch(
    geometry: &Geometry,
    raw_batch: &SegmentBatch,
    state: &mut SimState,
    event_id: u64,
    batch_index: u64,
    pixel_thresholds: &HashMap<i64, f64>,
) -> Result<()> {
    let mut batch = drop_degenerate(raw_batch);
    log::debug!("quenching: {} segments", batch.len());
    quenching::quench(&mut batch, &geometry.physics)?;
    log::debug!("drifting: {} segments", batch.len());
    drifting::drift(&mut batch, geometry)?;

    let mut pmax_bound = state.initial_pmax_bound;
    let mut assoc = None;
    for attempt in 0..MAX_CAPACITY_RETRIES {
        match pixel_association::associate_pixels(&batch, geometry, pmax_bound) {
            Ok(a) => {
                assoc = Some(a);
                break;
            }
            Err(Error::CapacityExceeded {
                kind: CapacityKind::ActivePixels,
                needed,
                ..
            }) => {
                log::warn!("active-pixel capacity exceeded (attempt {attempt}): needed {needed}, have {pmax_bound}");
                pmax_bound = (pmax_bound * 2).max(needed);
            }
            Err(e) => return Err(e),
        }
    }
    let assoc = match assoc {
        Some(a) => a,
        None => pixel_association::associate_pixels(&batch, geometry, pmax_bound)?,
    };
    state.initial_pmax_bound = pmax_bound;

    log::debug!("time intervals");
    let intervals = time_intervals::compute_time_intervals(&batch, geometry);

    log::debug!(
        "induced current: {} (segment,pixel,tick) triples",
        batch.len() * assoc.neighbor_width * intervals.t_batch
    );
    let signals = induced_current::compute_induced_current(&batch, geometry, &assoc, &intervals)?;

    log::debug!("pixel summation");
    let summary = pixel_summation::summarize_pixels(&batch, &assoc, &intervals, &signals, geometry.time_sampling);

    let event_start_ticks = (state.event_start_time(event_id, geometry.electronics.event_rate)
        / geometry.electronics.clock_cycle)
        .round()
        .max(0.0) as u64;

    log::debug!("front-end digitization: {} unique pixels", summary.unique_pixels.len());
    for (u, &pixel_id) in summary.unique_pixels.iter().enumerate() {
        let threshold = pixel_thresholds
            .get(&pixel_id)
            .copied()
            .unwrap_or(geometry.electronics.discrimination_threshold);
        let mut worker_rng = rng::worker_rng(state.global_seed, event_id, batch_index, pixel_id as u64);

        let pixel_signal = &summary.pixels_signals[u * summary.t_tot..(u + 1) * summary.t_tot];
        let track_signal: Vec<[f64; TRACK_SLOTS]> = (0..summary.t_tot)
            .map(|t| {
                let mut row = [0.0; TRACK_SLOTS];
                for (k, slot) in row.iter_mut().enumerate() {
                    *slot = summary.pixels_tracks_signals[(u * summary.t_tot + t) * TRACK_SLOTS + k];
                }
                row
            })
            .collect();
        let mut segment_slots = [-1i64; TRACK_SLOTS];
        segment_slots.copy_from_slice(&summary.track_pixel_map[u * TRACK_SLOTS..(u + 1) * TRACK_SLOTS]);

        let front_end = state.front_ends.entry(pixel_id).or_default();
        let (samples, truths) = front_end.sweep(
            pixel_signal,
            &track_signal,
            &geometry.electronics,
            threshold,
            geometry.time_sampling,
            &mut worker_rng,
            event_id,
            pixel_id,
            &segment_slots,
            event_start_ticks,
        );

        let base = state.adc_samples.len();
        state.adc_samples.extend(samples);
        state.truth.extend(truths.into_iter().map(|mut t| {
            t.sample_index += base;
            t
        }));
    }

    Ok(())
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

    fn central_segment() -> SegmentRecord {
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
    fn simulate_batch_runs_end_to_end() {
        let geom = geometry();
        let batch = SegmentBatch::from_records(&[central_segment()]);
        let mut state = SimState::new(42, 8);
        let result = simulate_batch(&geom, &batch, &mut state, 0, 0, &HashMap::new());
        assert!(result.is_ok());
    }

    #[test]
    fn first_event_starts_at_zero_later_events_advance() {
        let mut state = SimState::new(42, 8);
        assert_eq!(state.event_start_time(0, 100_000.0), 0.0);
        let second = state.event_start_time(1, 100_000.0);
        assert!(second > 0.0);
        // Repeated lookups of an already-seen event return the cached value.
        assert_eq!(state.event_start_time(0, 100_000.0), 0.0);
        assert_eq!(state.event_start_time(1, 100_000.0), second);
    }

    #[test]
    fn later_events_get_offset_timestamps() {
        let geom = geometry();
        let batch = SegmentBatch::from_records(&[central_segment()]);
        let mut state = SimState::new(42, 8);
        simulate_batch(&geom, &batch, &mut state, 0, 0, &HashMap::new()).unwrap();
        let first_event_samples = state.adc_samples.len();
        assert!(first_event_samples > 0);

        let mut later = central_segment();
        later.event_id = 1;
        let batch = SegmentBatch::from_records(&[later]);
        simulate_batch(&geom, &batch, &mut state, 1, 1, &HashMap::new()).unwrap();
        let timestamps: Vec<u64> = state.adc_samples[first_event_samples..]
            .iter()
            .map(|s| s.timestamp_ticks)
            .collect();
        assert!(!timestamps.is_empty());
        assert!(timestamps.iter().all(|&t| t > 0));
    }

    #[test]
    fn degenerate_segments_are_dropped_not_fatal() {
        let geom = geometry();
        let mut record = central_segment();
        record.x_end = record.x_start;
        record.y_end = record.y_start;
        record.z_end = record.z_start;
        record.z = record.z_start;
        let batch = SegmentBatch::from_records(&[record]);
        let mut state = SimState::new(42, 8);
        let result = simulate_batch(&geom, &batch, &mut state, 0, 0, &HashMap::new());
        assert!(result.is_ok());
        assert!(state.adc_samples.is_empty());
    }
}
