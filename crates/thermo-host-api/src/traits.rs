//! Host errors and events

use std::path::PathBuf;
use thermo_util::ObjectId;
use thiserror::Error;

use crate::ExitStatus;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Events from the host, delivered to the daemon loop
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A wait armed for `target` has expired
    Wakeup { target: ObjectId },

    /// Free space on `mount_path` fell below the configured limit
    DiskSpaceLow { mount_path: PathBuf },

    /// The cleanup helper exited
    ReaperExited { pid: u32, status: ExitStatus },
}
