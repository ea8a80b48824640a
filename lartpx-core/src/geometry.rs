//! Immutable, validated geometry/physics/electronics table (spec §4.A).
//!
//! Built once from the three descriptor configs and then shared
//! read-only (`Arc<Geometry>`) across every pipeline stage, per the
//! "global mutable constants" Design Note: no hidden process-wide state.

use crate::config::{ElectronicsConfig, GeometryConfig, PhysicsConfig, PlaneConfig};
use crate::error::{Error, Result};

/// One anode plane's frozen geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// `(min, max)` extent along x, cm.
    pub x_border: (f64, f64),
    /// `(min, max)` extent along y, cm.
    pub y_border: (f64, f64),
    /// `(min, max)` extent along z (drift axis), cm.
    pub z_border: (f64, f64),
    /// z-coordinate of the anode plane, cm.
    pub anode_z: f64,
    /// Pixel pitch, cm.
    pub pitch: f64,
    /// Number of pixel columns.
    pub nx: i32,
    /// Number of pixel rows.
    pub ny: i32,
}

impl Plane {
    fn from_config(cfg: &PlaneConfig) -> Result<Self> {
        if cfg.pitch <= 0.0 {
            return Err(Error::InvalidConfig {
                reason: "pixel pitch must be positive".into(),
            });
        }
        if cfg.nx <= 0 || cfg.ny <= 0 {
            return Err(Error::InvalidConfig {
                reason: "nx and ny must be positive".into(),
            });
        }
        Ok(Self {
            x_border: cfg.x_border,
            y_border: cfg.y_border,
            z_border: cfg.z_border,
            anode_z: cfg.anode_z,
            pitch: cfg.pitch,
            nx: cfg.nx,
            ny: cfg.ny,
        })
    }

    /// Pixel center x-coordinate for column `ix`.
    #[inline]
    #[must_use]
    pub fn pixel_center_x(&self, ix: i32) -> f64 {
        self.x_border.0 + f64::from(ix) * self.pitch + self.pitch / 2.0
    }

    /// Pixel center y-coordinate for row `iy`.
    #[inline]
    #[must_use]
    pub fn pixel_center_y(&self, iy: i32) -> f64 {
        self.y_border.0 + f64::from(iy) * self.pitch + self.pitch / 2.0
    }

    /// Converts a world x-coordinate into the (possibly out-of-range)
    /// pixel column index.
    #[inline]
    #[must_use]
    pub fn column_of(&self, x: f64) -> i32 {
        ((x - self.x_border.0) / self.pitch).floor() as i32
    }

    /// Converts a world y-coordinate into the (possibly out-of-range)
    /// pixel row index.
    #[inline]
    #[must_use]
    pub fn row_of(&self, y: f64) -> i32 {
        ((y - self.y_border.0) / self.pitch).floor() as i32
    }
}

/// The frozen, validated geometry/physics/electronics table.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Per-plane geometry, indexed by `pixel_plane`.
    pub planes: Vec<Plane>,
    /// Drift velocity, cm/us.
    pub drift_velocity: f64,
    /// Electron lifetime, us (`None` = infinite).
    pub electron_lifetime: Option<f64>,
    /// Longitudinal diffusion coefficient, cm^2/us.
    pub longitudinal_diffusion: f64,
    /// Transverse diffusion coefficient, cm^2/us.
    pub transverse_diffusion: f64,
    /// Sampling period, us.
    pub time_sampling: f64,
    /// Simulation time window, us.
    pub time_window: (f64, f64),
    /// Signal-window guard padding, us.
    pub time_padding: f64,
    /// Physics constants.
    pub physics: PhysicsConfig,
    /// Electronics constants.
    pub electronics: ElectronicsConfig,
}

impl Geometry {
    /// Builds and validates a [`Geometry`] from the three descriptor
    /// configs.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if any plane is malformed or if
    /// drift velocity / sampling period are non-positive.
    pub fn from_configs(
        geometry: &GeometryConfig,
        physics: PhysicsConfig,
        electronics: ElectronicsConfig,
    ) -> Result<Self> {
        if geometry.planes.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "geometry must define at least one plane".into(),
            });
        }
        if geometry.drift_velocity <= 0.0 {
            return Err(Error::InvalidConfig {
                reason: "drift_velocity must be positive".into(),
            });
        }
        if geometry.time_sampling <= 0.0 {
            return Err(Error::InvalidConfig {
                reason: "time_sampling must be positive".into(),
            });
        }
        let planes = geometry
            .planes
            .iter()
            .map(Plane::from_config)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            planes,
            drift_velocity: geometry.drift_velocity,
            electron_lifetime: geometry.electron_lifetime,
            longitudinal_diffusion: geometry.longitudinal_diffusion,
            transverse_diffusion: geometry.transverse_diffusion,
            time_sampling: geometry.time_sampling,
            time_window: geometry.time_window,
            time_padding: geometry.time_padding,
            physics,
            electronics,
        })
    }

    /// Returns the plane for the given index, if present.
    #[inline]
    #[must_use]
    pub fn plane(&self, index: u32) -> Option<&Plane> {
        self.planes.get(index as usize)
    }

    /// `z_sampling = time_sampling * drift_velocity`, the quantization
    /// step along the drift axis used by induced-current integration
    /// (spec §4.F step 4).
    #[inline]
    #[must_use]
    pub fn z_sampling(&self) -> f64 {
        self.time_sampling * self.drift_velocity
    }
}
