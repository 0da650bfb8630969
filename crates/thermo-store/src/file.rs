//! File-backed temperature log

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thermo_util::MonotonicInstant;
use tracing::{debug, warn};

use crate::{StoreError, StoreResult, TemperatureLog, TemperatureRecord};

struct LogState {
    file: Option<File>,
    started: Option<MonotonicInstant>,
}

/// Appends `unix_time elapsed_seconds temperature STATUS` lines.
///
/// The file is opened on first use; an open failure is retried on the next
/// append. Elapsed time is counted from the first record written.
pub struct FileTemperatureLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl FileTemperatureLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(LogState {
                file: None,
                started: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> StoreResult<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .inspect_err(|e| {
                warn!(path = %self.path.display(), error = %e, "Error opening thermal log");
            })?;

        debug!(path = %self.path.display(), "Thermal log opened");
        Ok(file)
    }
}

impl TemperatureLog for FileTemperatureLog {
    fn append(&self, record: &TemperatureRecord) -> StoreResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("thermal log lock poisoned".into()))?;

        if state.file.is_none() {
            state.file = Some(self.open()?);
        }

        let now = MonotonicInstant::now();
        let started = *state.started.get_or_insert(now);
        let elapsed = now.duration_since(started).as_secs();

        let line = format!(
            "{} {} {} {}\n",
            record.unix_time,
            elapsed,
            record.temperature,
            record.status.log_name()
        );

        if let Some(file) = state.file.as_mut() {
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }

        Ok(())
    }
}
