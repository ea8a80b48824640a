//! lartpx-core: geometry, segment batches, and shared types for
//! simulating a pixelated LArTPC's detector response.
//!
//! This crate provides the immutable configuration table, the
//! Structure-of-Arrays segment batch the pipeline streams over, pixel
//! identity codecs, and the error taxonomy shared by `lartpx-sim` and
//! `lartpx-io`.

mod config;
mod error;
mod geometry;
mod output;
mod pixel;
mod segment;

pub use config::{ElectronicsConfig, GeometryConfig, PhysicsConfig, PlaneConfig, QuenchingModel};
pub use error::{CapacityKind, Error, Result};
pub use geometry::{Geometry, Plane};
pub use output::{AdcSample, TruthContribution};
pub use pixel::{PixelCoord, PIXEL_SENTINEL};
pub use segment::{SegmentBatch, SegmentRecord};
