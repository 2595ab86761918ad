//! CSV persistence for (raw, smoothed) spectrum pairs.
//!
//! The on-disk format is a header line `Channel,Raw,Smoothed` followed by
//! exactly [`CHANNEL_COUNT`] rows of `index,rawValue,smoothedValue`.
//! Loading mirrors the wire protocol's tolerance for malformed input: a
//! row with the wrong field count or unparsable numeric fields degrades to
//! `(0, 0)` for that row, never a hard failure. Only a missing file is an
//! error in itself.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

use crate::acquisition::CHANNEL_COUNT;
use crate::error::{AppResult, McaError};

/// Header record written ahead of the data rows.
const HEADER: [&str; 3] = ["Channel", "Raw", "Smoothed"];

/// Write a (raw, smoothed) pair to `path`.
///
/// Exactly [`CHANNEL_COUNT`] rows are written regardless of input length;
/// missing values are zero-filled so the stored file always satisfies the
/// length invariant.
pub fn save(raw: &[u32], smoothed: &[u32], path: &Path) -> AppResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for i in 0..CHANNEL_COUNT {
        let r = raw.get(i).copied().unwrap_or(0);
        let s = smoothed.get(i).copied().unwrap_or(0);
        writer.write_record(&[i.to_string(), r.to_string(), s.to_string()])?;
    }
    writer.flush()?;
    info!("Spectrum saved to '{}'", path.display());
    Ok(())
}

/// Load a (raw, smoothed) pair from `path`.
///
/// Fails with [`McaError::FileNotFound`] only when the path does not
/// exist. Malformed rows load as `(0, 0)`; rows beyond the first
/// [`CHANNEL_COUNT`] are ignored with a warning.
pub fn load(path: &Path) -> AppResult<(Vec<u32>, Vec<u32>)> {
    if !path.exists() {
        return Err(McaError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut raw = Vec::new();
    let mut smoothed = Vec::new();
    let mut malformed = 0usize;

    for record in reader.records() {
        if raw.len() >= CHANNEL_COUNT {
            warn!(
                "'{}' has more than {} data rows; extra rows ignored",
                path.display(),
                CHANNEL_COUNT
            );
            break;
        }
        let (r, s) = match record {
            Ok(row) => parse_row(&row).unwrap_or_else(|| {
                malformed += 1;
                (0, 0)
            }),
            // A row the CSV reader itself rejects degrades like any
            // other malformed row.
            Err(_) => {
                malformed += 1;
                (0, 0)
            }
        };
        raw.push(r);
        smoothed.push(s);
    }

    if malformed > 0 {
        warn!(
            "{} malformed rows in '{}' loaded as zeros",
            malformed,
            path.display()
        );
    }
    info!("Spectrum loaded from '{}' ({} rows)", path.display(), raw.len());
    Ok((raw, smoothed))
}

/// Parse one data row: exactly three fields, with parseable raw and
/// smoothed counts. The channel-index field is positional and ignored.
fn parse_row(row: &csv::StringRecord) -> Option<(u32, u32)> {
    if row.len() != 3 {
        return None;
    }
    let r = row.get(1)?.trim().parse::<u32>().ok()?;
    let s = row.get(2)?.trim().parse::<u32>().ok()?;
    Some((r, s))
}

/// Timestamped output path in `dir`, e.g. `spectrum_20260807_153012.csv`.
pub fn timestamped_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        "spectrum_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
