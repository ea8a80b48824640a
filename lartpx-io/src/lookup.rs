//! Optional bad-channel and pixel-threshold lookup tables (spec §6).

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Loads a bad-channel list: one encoded pixel ID per non-empty,
/// non-comment line. Channels on this list are excluded from
/// digitization by the caller.
pub fn load_bad_channels<P: AsRef<Path>>(path: P) -> Result<Vec<i64>> {
    let text = std::fs::read_to_string(path)?;
    let mut channels = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let id: i64 = line.parse().map_err(|e| Error::InvalidRecord {
            line: line_no + 1,
            reason: format!("'{line}' is not a pixel ID: {e}"),
        })?;
        channels.push(id);
    }
    Ok(channels)
}

/// Loads a per-pixel discrimination threshold override table:
/// `pixel_id,threshold` rows. Pixels absent from the table use the
/// electronics descriptor's default `discrimination_threshold`.
pub fn load_pixel_thresholds<P: AsRef<Path>>(path: P) -> Result<HashMap<i64, f64>> {
    let text = std::fs::read_to_string(path)?;
    let mut table = HashMap::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (id_str, threshold_str) = line.split_once(',').ok_or_else(|| Error::InvalidRecord {
            line: line_no + 1,
            reason: format!("expected 'pixel_id,threshold', found '{line}'"),
        })?;
        let id: i64 = id_str.trim().parse().map_err(|e| Error::InvalidRecord {
            line: line_no + 1,
            reason: format!("pixel_id '{id_str}' is not an integer: {e}"),
        })?;
        let threshold: f64 = threshold_str.trim().parse().map_err(|e| Error::InvalidRecord {
            line: line_no + 1,
            reason: format!("threshold '{threshold_str}' is not a number: {e}"),
        })?;
        table.insert(id, threshold);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_bad_channel_list() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "# disabled front ends\n100\n204\n").unwrap();
        let channels = load_bad_channels(file.path()).unwrap();
        assert_eq!(channels, vec![100, 204]);
    }

    #[test]
    fn loads_pixel_threshold_table() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "100,8000\n204,6500\n").unwrap();
        let table = load_pixel_thresholds(file.path()).unwrap();
        assert_eq!(table.get(&100), Some(&8000.0));
        assert_eq!(table.get(&204), Some(&6500.0));
    }

    #[test]
    fn malformed_threshold_row_is_invalid_record() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not-a-row\n").unwrap();
        let err = load_pixel_thresholds(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { line: 1, .. }));
    }
}
