//! lartpx-io: descriptor loading, segment input reading, and ADC/truth
//! output writing for the LArTPC pixel-readout simulation pipeline.

mod config_loader;
mod error;
mod lookup;
mod segment_reader;
mod writer;

pub use config_loader::{load_electronics_config, load_geometry_config, load_physics_config};
pub use error::{Error, Result};
pub use lookup::{load_bad_channels, load_pixel_thresholds};
pub use segment_reader::{MappedFileReader, SegmentFileReader, SegmentReadOptions};
pub use writer::{SampleFileWriter, TruthFileWriter};
