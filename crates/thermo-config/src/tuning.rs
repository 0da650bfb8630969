//! Runtime tuning files
//!
//! A tuning file replaces an object's bands while the daemon runs. It holds
//! one `min, max, mintime` row per level, coolest first; `maxtime` is always
//! `mintime + 10`. A file that does not yield a full table is discarded as a
//! whole and the current bands stay in force.

use std::path::Path;
use thermo_api::{LevelBand, LevelTable, LEVEL_COUNT};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Seconds added to a tuned `mintime` to get its `maxtime`
pub const TUNING_MAXTIME_SLACK: u32 = 10;

/// Why a tuning file was discarded
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("syntax error in thermal tuning on line {line}")]
    Syntax { line: usize },

    #[error("thermal tuning ends after {found} of {expected} lines")]
    Truncated { found: usize, expected: usize },

    #[error("failed to read thermal tuning: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of attempting to read a tuning file
#[derive(Debug)]
pub enum TuningOutcome {
    /// The file parsed; these bands replace the current ones
    Applied(LevelTable),
    /// The file exists but was rejected
    Discarded(TuningError),
    /// No tuning file for this object
    Absent,
}

/// Parse tuning content on top of `current`.
///
/// Only `min`, `max`, `mintime` and `maxtime` of each level are replaced;
/// rows after the last level are ignored.
pub fn parse_tuning(content: &str, current: &LevelTable) -> Result<LevelTable, TuningError> {
    let mut table = *current;
    let mut rows = content.lines().filter(|line| !line.trim().is_empty());

    for (i, band) in table.iter_mut().enumerate() {
        let line = i + 1;
        let row = rows.next().ok_or(TuningError::Truncated {
            found: i,
            expected: LEVEL_COUNT,
        })?;

        let (min, max, mintime) = parse_row(row).ok_or(TuningError::Syntax { line })?;
        *band = LevelBand::new(min, max, mintime, mintime.saturating_add(TUNING_MAXTIME_SLACK));
    }

    Ok(table)
}

/// `min, max, mintime`; wake intervals are unsigned, so a negative
/// `mintime` makes the row malformed
fn parse_row(row: &str) -> Option<(i32, i32, u32)> {
    let mut fields = row.split(',').map(str::trim);

    let min = fields.next()?.parse().ok()?;
    let max = fields.next()?.parse().ok()?;
    let mintime = fields.next()?.parse().ok()?;

    if fields.next().is_some() {
        return None;
    }

    Some((min, max, mintime))
}

/// Try to read the tuning file at `path` for the object named `object`
pub fn load_tuning(path: &Path, object: &str, current: &LevelTable) -> TuningOutcome {
    debug!(object, path = %path.display(), "Trying tuning file");

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(object, "No thermal tuning file; no change in thermal values");
            return TuningOutcome::Absent;
        }
        Err(e) => {
            warn!(object, error = %e, "Cannot read thermal tuning file");
            return TuningOutcome::Discarded(e.into());
        }
    };

    match parse_tuning(&content, current) {
        Ok(table) => {
            info!(
                object,
                "(Re)read thermal tuning file; thermal values may have changed"
            );
            TuningOutcome::Applied(table)
        }
        Err(e) => {
            warn!(object, error = %e, "Bad thermal tuning file");
            info!(object, "Thermal tuning file discarded; no change in thermal values");
            TuningOutcome::Discarded(e)
        }
    }
}
