//! Segment input reading (spec §6): a memory-mapped, line-oriented CSV
//! of track segments, the producer-side input to the simulation
//! pipeline.
//!
//! Follows the same `MappedFileReader`/format-specific-reader split
//! used elsewhere in this workspace: a thin mmap wrapper underneath a
//! format-aware reader that turns raw bytes into typed records.

use crate::{Error, Result};
use lartpx_core::SegmentRecord;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A memory-mapped file reader.
pub struct MappedFileReader {
    mmap: Mmap,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }
}

/// Column order expected in the segment CSV, one header-less row per
/// segment: `event_id,x_start,y_start,z_start,x_end,y_end,z_end,x,y,z,
/// t_start,t_end,t,d_e,d_e_dx,pixel_plane[,n_photons]`.
///
/// `t0_start`/`t0_end`/`t0` are seeded from `t_start`/`t_end`/`t` on
/// read (drifting has not run yet); `n_electrons`/`long_diff`/
/// `tran_diff` are zeroed, filled later by quenching/drifting.
const MIN_FIELDS: usize = 16;

/// A segment-input file reader.
pub struct SegmentFileReader {
    reader: MappedFileReader,
}

/// Reader options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentReadOptions {
    /// Swap the `x`/`z` coordinate roles on read (opt-in per spec §9's
    /// coordinate-convention Open Question — left off by default since
    /// the native convention already treats `z` as the drift axis).
    pub swap_xz: bool,
    /// Stop after this many segments, if set.
    pub limit: Option<usize>,
}

impl SegmentFileReader {
    /// Opens a segment file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            reader: MappedFileReader::open(path)?,
        })
    }

    /// Parses every segment row in the file, in order.
    pub fn read_segments(&self, options: SegmentReadOptions) -> Result<Vec<SegmentRecord>> {
        let text = std::str::from_utf8(self.reader.as_bytes()).map_err(|e| Error::InvalidRecord {
            line: 0,
            reason: format!("file is not valid UTF-8: {e}"),
        })?;

        let mut records = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(limit) = options.limit {
                if records.len() >= limit {
                    break;
                }
            }
            records.push(parse_record(line, line_no + 1, options.swap_xz)?);
        }
        Ok(records)
    }
}

fn parse_record(line: &str, line_no: usize, swap_xz: bool) -> Result<SegmentRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < MIN_FIELDS {
        return Err(Error::InvalidRecord {
            line: line_no,
            reason: format!(
                "expected at least {MIN_FIELDS} fields, found {}",
                fields.len()
            ),
        });
    }

    let field = |idx: usize| -> Result<f64> {
        fields[idx].trim().parse::<f64>().map_err(|e| Error::InvalidRecord {
            line: line_no,
            reason: format!("field {idx} ('{}') is not a number: {e}", fields[idx]),
        })
    };

    let event_id: u64 = fields[0].trim().parse().map_err(|e| Error::InvalidRecord {
        line: line_no,
        reason: format!("event_id '{}' is not an integer: {e}", fields[0]),
    })?;

    let (mut x_start, y_start, mut z_start) = (field(1)?, field(2)?, field(3)?);
    let (mut x_end, y_end, mut z_end) = (field(4)?, field(5)?, field(6)?);
    let (mut x, y, mut z) = (field(7)?, field(8)?, field(9)?);

    if swap_xz {
        std::mem::swap(&mut x_start, &mut z_start);
        std::mem::swap(&mut x_end, &mut z_end);
        std::mem::swap(&mut x, &mut z);
    }

    let t_start = field(10)?;
    let t_end = field(11)?;
    let t = field(12)?;
    let d_e = field(13)?;
    let d_e_dx = field(14)?;
    let pixel_plane: u32 = fields[15].trim().parse().map_err(|e| Error::InvalidRecord {
        line: line_no,
        reason: format!("pixel_plane '{}' is not an integer: {e}", fields[15]),
    })?;
    let n_photons = fields
        .get(16)
        .and_then(|s| s.trim().parse::<f64>().ok());

    Ok(SegmentRecord {
        event_id,
        x_start,
        y_start,
        z_start,
        x_end,
        y_end,
        z_end,
        x,
        y,
        z,
        t_start,
        t_end,
        t,
        t0_start: t_start,
        t0_end: t_end,
        t0: t,
        d_e,
        d_e_dx,
        n_electrons: 0.0,
        long_diff: 0.0,
        tran_diff: 0.0,
        pixel_plane,
        n_photons,
    })
}
