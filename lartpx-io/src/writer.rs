//! ADC sample and MC-truth output writers (spec §3/§6), mirroring the
//! teacher's `BufWriter`-backed `Tpx3FileWriter`.

use crate::Result;
use lartpx_core::{AdcSample, TruthContribution};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for the ADC sample stream and its optional MC-truth
/// side-channel.
pub struct SampleFileWriter {
    writer: BufWriter<File>,
}

impl SampleFileWriter {
    /// Creates a new ADC sample writer, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Writes ADC samples as CSV: `event_id,pixel_id,adc_count,timestamp_ticks`.
    pub fn write_samples_csv(&mut self, samples: &[AdcSample]) -> Result<()> {
        writeln!(self.writer, "event_id,pixel_id,adc_count,timestamp_ticks")?;
        for s in samples {
            writeln!(
                self.writer,
                "{},{},{},{}",
                s.event_id, s.pixel_id, s.adc_count, s.timestamp_ticks
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writer for the MC-truth side-channel: which segments contributed
/// what fraction to each emitted sample.
pub struct TruthFileWriter {
    writer: BufWriter<File>,
}

impl TruthFileWriter {
    /// Creates a new truth writer, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Writes truth contributions as flattened CSV:
    /// `sample_index,segment_index,fraction`, one row per
    /// `(segment_index, fraction)` pair in each contribution.
    pub fn write_truth_csv(&mut self, contributions: &[TruthContribution]) -> Result<()> {
        writeln!(self.writer, "sample_index,segment_index,fraction")?;
        for c in contributions {
            for (segment_index, fraction) in &c.fractions {
                writeln!(self.writer, "{},{},{}", c.sample_index, segment_index, fraction)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
