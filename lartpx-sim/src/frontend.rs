//! Front-End Digitization (spec §4.H): a per-pixel, self-triggering
//! state machine that watches summed current, triggers on threshold
//! crossing, holds, samples to an ADC count, and enforces a busy
//! period. Single-threaded per pixel, parallel across pixels.

use crate::TRACK_SLOTS;
use lartpx_core::{AdcSample, ElectronicsConfig, TruthContribution};
use rand::Rng;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Holding,
    Busy,
}

/// One pixel's digitization state, carried across batches within a run.
pub struct FrontEnd {
    state: State,
    integral: f64,
    track_integrals: [f64; TRACK_SLOTS],
    ticks_in_state: u32,
    trigger_tick: i64,
    samples_emitted: u32,
    last_trigger_tick: Option<i64>,
    /// Pedestal offset accumulated from reset noise during the busy
    /// period (spec §4.H: reset noise is added to the pedestal, which
    /// then feeds the next sample's quantization baseline).
    pedestal_offset: f64,
}

impl Default for FrontEnd {
    fn default() -> Self {
        Self {
            state: State::Idle,
            integral: 0.0,
            track_integrals: [0.0; TRACK_SLOTS],
            ticks_in_state: 0,
            trigger_tick: 0,
            samples_emitted: 0,
            last_trigger_tick: None,
            pedestal_offset: 0.0,
        }
    }
}

impl FrontEnd {
    /// Creates a fresh, `Idle` state machine for one pixel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweeps `pixel_signal`/`track_signal` one tick at a time, emitting
    /// ADC samples and their MC-truth attribution. `segment_slots` maps
    /// each track-breakdown column back to the contributing segment's
    /// index, for the truth side-channel (spec §6). `event_start_ticks`
    /// is this event's absolute start offset (in clock ticks); each
    /// sample's timestamp is `event_start_ticks + intra-event tick`,
    /// wrapped modulo `rollover_cycles` (spec §6).
    #[allow(clippy::too_many_arguments)]
    pub fn sweep(
        &mut self,
        pixel_signal: &[f64],
        track_signal: &[[f64; TRACK_SLOTS]],
        electronics: &ElectronicsConfig,
        threshold: f64,
        dt: f64,
        rng: &mut impl Rng,
        event_id: u64,
        pixel_id: i64,
        segment_slots: &[i64; TRACK_SLOTS],
        event_start_ticks: u64,
    ) -> (Vec<AdcSample>, Vec<TruthContribution>) {
        let mut samples = Vec::new();
        let mut truths = Vec::new();

        let uncorrelated = Normal::new(0.0, electronics.uncorrelated_noise_charge.max(1e-9)).unwrap();
        let discriminator = Normal::new(0.0, electronics.discriminator_noise.max(1e-9)).unwrap();
        let reset = Normal::new(0.0, electronics.reset_noise_charge.max(1e-9)).unwrap();

        for t in 0..pixel_signal.len() {
            if self.samples_emitted >= electronics.max_adc_values {
                break;
            }
            match self.state {
                State::Idle => {
                    self.integral += pixel_signal[t] * dt + uncorrelated.sample(rng);
                    for k in 0..TRACK_SLOTS {
                        self.track_integrals[k] += track_signal[t][k] * dt;
                    }
                    let noisy_threshold = threshold + discriminator.sample(rng);
                    if self.integral > noisy_threshold {
                        let tick = t as i64;
                        debug_assert!(self.last_trigger_tick.map_or(true, |last| tick > last));
                        self.trigger_tick = tick;
                        self.last_trigger_tick = Some(tick);
                        self.state = State::Holding;
                        self.ticks_in_state = 0;
                    }
                }
                State::Holding => {
                    self.integral += pixel_signal[t] * dt;
                    for k in 0..TRACK_SLOTS {
                        self.track_integrals[k] += track_signal[t][k] * dt;
                    }
                    self.ticks_in_state += 1;
                    if self.ticks_in_state >= electronics.adc_hold_delay {
                        let adc = quantize(
                            electronics.v_pedestal + self.pedestal_offset + self.integral * electronics.gain
                                - electronics.v_cm,
                            electronics.v_cm,
                            electronics.v_ref,
                            electronics.adc_counts,
                        );
                        self.pedestal_offset = 0.0;
                        let timestamp =
                            (self.trigger_tick.max(0) as u64 + event_start_ticks) % electronics.rollover_cycles;
                        samples.push(AdcSample {
                            event_id,
                            pixel_id,
                            adc_count: adc,
                            timestamp_ticks: timestamp,
                        });
                        if self.integral > 0.0 {
                            let fractions: Vec<(usize, f64)> = (0..TRACK_SLOTS)
                                .filter(|&k| self.track_integrals[k] > 0.0 && segment_slots[k] >= 0)
                                .map(|k| (segment_slots[k] as usize, self.track_integrals[k] / self.integral))
                                .collect();
                            if !fractions.is_empty() {
                                truths.push(TruthContribution {
                                    sample_index: samples.len() - 1,
                                    fractions,
                                });
                            }
                        }
                        self.integral = 0.0;
                        self.track_integrals = [0.0; TRACK_SLOTS];
                        self.samples_emitted += 1;
                        self.state = State::Busy;
                        self.ticks_in_state = 0;
                    }
                }
                State::Busy => {
                    self.pedestal_offset += reset.sample(rng);
                    self.ticks_in_state += 1;
                    if self.ticks_in_state >= electronics.adc_busy_delay + electronics.reset_cycles {
                        self.state = State::Idle;
                        self.ticks_in_state = 0;
                        self.integral = 0.0;
                    }
                }
            }
        }
        (samples, truths)
    }
}

/// Converts an analog level in mV to an ADC count, clamped to
/// `[v_cm, v_ref]` and quantized over `adc_counts` steps.
fn quantize(value_mv: f64, v_cm: f64, v_ref: f64, adc_counts: u32) -> u32 {
    let clamped = value_mv.clamp(v_cm.min(v_ref), v_cm.max(v_ref));
    let span = (v_ref - v_cm).abs().max(1e-9);
    let frac = (clamped - v_cm.min(v_ref)) / span;
    ((frac * (adc_counts - 1) as f64).round() as u32).min(adc_counts - 1)
}
