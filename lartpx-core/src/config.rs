//! Raw, deserializable configuration structs for the three descriptor
//! documents named in spec §4.A/§4.H/§6: geometry, physics, electronics.
//!
//! These are plain data with documented defaults. `lartpx-io` is the
//! only crate that reads them from YAML; `lartpx-core` just defines the
//! shape and turns a validated triple into a frozen [`crate::Geometry`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recombination model selection for quenching (spec §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QuenchingModel {
    /// Box model: `R = max(0, ln(alpha + xi) / xi)`.
    Box,
    /// Birks model: `R = A_b / (1 + k_b * dE/dx / (E * rho))`.
    #[default]
    Birks,
}

/// One anode plane's borders and pixel grid, as loaded from the
/// geometry descriptor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneConfig {
    /// `(min, max)` extent of the TPC module along x, in cm.
    pub x_border: (f64, f64),
    /// `(min, max)` extent of the TPC module along y, in cm.
    pub y_border: (f64, f64),
    /// `(min, max)` extent of the TPC module along the drift axis z, in cm.
    pub z_border: (f64, f64),
    /// z-coordinate of the anode (pixel) plane, in cm.
    pub anode_z: f64,
    /// Pixel pitch, in cm.
    pub pitch: f64,
    /// Number of pixel columns.
    pub nx: i32,
    /// Number of pixel rows.
    pub ny: i32,
}

/// Geometry descriptor: TPC module borders, pixel grids, and drift
/// parameters (spec §4.A).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryConfig {
    /// One entry per anode plane / TPC module.
    pub planes: Vec<PlaneConfig>,
    /// Drift velocity, cm/us.
    pub drift_velocity: f64,
    /// Electron lifetime, us. `None` means infinite lifetime (no
    /// attenuation), matching spec invariant 2's `tau = infinity` case.
    pub electron_lifetime: Option<f64>,
    /// Longitudinal diffusion coefficient, cm^2/us.
    pub longitudinal_diffusion: f64,
    /// Transverse diffusion coefficient, cm^2/us.
    pub transverse_diffusion: f64,
    /// Sampling period, us.
    pub time_sampling: f64,
    /// Simulation time window `[t0, t1]`, us.
    pub time_window: (f64, f64),
    /// Guard padding added on each side of a segment's signal window, us.
    pub time_padding: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            planes: vec![PlaneConfig {
                x_border: (-30.0, 30.0),
                y_border: (-30.0, 30.0),
                z_border: (0.0, 30.0),
                anode_z: 0.0,
                pitch: 0.4434,
                nx: 140,
                ny: 140,
            }],
            drift_velocity: 0.153_812,
            electron_lifetime: Some(2.2e3),
            longitudinal_diffusion: 4.0e-6,
            transverse_diffusion: 8.8e-6,
            time_sampling: 0.1,
            time_window: (0.0, 200.0),
            time_padding: 20.0,
        }
    }
}

/// Physics descriptor: recombination and conversion constants (spec
/// §4.A/§4.B). Defaults grounded in `larnd-sim`'s
/// `larndsim/consts/physics.py`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicsConfig {
    /// Which recombination model to apply.
    pub quenching_model: QuenchingModel,
    /// Box model alpha.
    pub box_alpha: f64,
    /// Box model beta, (kV/cm)(g/cm^2)/MeV.
    pub box_beta: f64,
    /// Birks model A_b.
    pub birks_ab: f64,
    /// Birks model k_b, (kV/cm)(g/cm^2)/MeV.
    pub birks_kb: f64,
    /// Applied electric field, kV/cm.
    pub e_field: f64,
    /// Liquid argon density, g/cm^3.
    pub lar_density: f64,
    /// Mean energy per ion pair, MeV.
    pub w_ion: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            quenching_model: QuenchingModel::Birks,
            box_alpha: 0.93,
            box_beta: 0.207,
            birks_ab: 0.800,
            birks_kb: 0.0486,
            e_field: 0.50,
            lar_density: 1.38,
            w_ion: 23.6e-6,
        }
    }
}

impl PhysicsConfig {
    /// Electrons produced per MeV of deposited energy before
    /// recombination, `1 / w_ion`.
    #[must_use]
    pub fn mev_to_electrons(&self) -> f64 {
        1.0 / self.w_ion
    }
}

/// Electronics descriptor: front-end digitization constants (spec
/// §4.H). Defaults grounded in `larnd-sim`'s
/// `larndsim/consts/electronics.py`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElectronicsConfig {
    /// Discrimination threshold, electrons. Overridden per-pixel by an
    /// optional threshold lookup (spec §6).
    pub discrimination_threshold: f64,
    /// Hold delay after trigger, in clock ticks.
    pub adc_hold_delay: u32,
    /// Busy delay after sampling, in clock ticks.
    pub adc_busy_delay: u32,
    /// Reset time, in clock ticks.
    pub reset_cycles: u32,
    /// Clock cycle duration, us.
    pub clock_cycle: f64,
    /// Timestamp rollover modulus, in clock ticks.
    pub rollover_cycles: u64,
    /// Front-end gain, mV/e-.
    pub gain: f64,
    /// Buffer risetime, us (informational; not separately modeled).
    pub buffer_risetime: f64,
    /// Common-mode voltage, mV.
    pub v_cm: f64,
    /// Reference voltage, mV.
    pub v_ref: f64,
    /// Pedestal voltage, mV.
    pub v_pedestal: f64,
    /// Number of ADC counts (e.g. 256 for 8-bit).
    pub adc_counts: u32,
    /// Reset noise, electrons (std dev).
    pub reset_noise_charge: f64,
    /// Uncorrelated (integration) noise, electrons (std dev).
    pub uncorrelated_noise_charge: f64,
    /// Discriminator noise, electrons (std dev).
    pub discriminator_noise: f64,
    /// Hard cap on ADC samples emitted per pixel per batch.
    pub max_adc_values: u32,
    /// Mean time between events, us (rate = 1 / event_rate).
    pub event_rate: f64,
}

impl Default for ElectronicsConfig {
    fn default() -> Self {
        Self {
            discrimination_threshold: 7.0e3,
            adc_hold_delay: 15,
            adc_busy_delay: 9,
            reset_cycles: 1,
            clock_cycle: 0.1,
            rollover_cycles: 1 << 31,
            gain: 4.0 / 1.0e3,
            buffer_risetime: 0.100,
            v_cm: 288.0,
            v_ref: 1300.0,
            v_pedestal: 580.0,
            adc_counts: 256,
            reset_noise_charge: 900.0,
            uncorrelated_noise_charge: 500.0,
            discriminator_noise: 650.0,
            max_adc_values: 10,
            event_rate: 100_000.0,
        }
    }
}
