//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Temp reaper settings
    #[serde(default)]
    pub reaper: RawReaperConfig,

    /// Monitored thermal objects, in registration order
    #[serde(default)]
    pub objects: Vec<RawThermalObject>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// IPC socket path (default: /run/thermod/thermod.sock)
    pub socket_path: Option<PathBuf>,

    /// Directory holding `temp_<object>` tuning files
    pub tuning_dir: Option<PathBuf>,

    /// Re-read tuning files before every classification from startup
    pub tuning_enabled: Option<bool>,

    /// Append a line per reading to this file
    pub temperature_log: Option<PathBuf>,

    /// Abandon a sensor request that has not completed after this long
    pub request_timeout_seconds: Option<u64>,

    /// Wake slot length used to batch polls of different objects
    pub heartbeat_period_seconds: Option<u64>,
}

/// Temp reaper and disk monitor settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawReaperConfig {
    pub enabled: Option<bool>,

    /// Cleanup helper executable
    pub helper_path: Option<PathBuf>,

    /// Directory handed to the helper
    pub target_dir: Option<PathBuf>,

    /// Accounts tried in order when dropping privileges
    pub users: Option<Vec<String>>,

    /// Scheduling priority for the helper
    pub priority: Option<i32>,

    /// Mount points checked by the disk monitor
    pub watch_mounts: Option<Vec<PathBuf>>,

    /// Low-space trigger, as a percentage of free blocks
    pub min_free_percent: Option<u8>,

    pub check_interval_seconds: Option<u64>,
}

/// Raw thermal object definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawThermalObject {
    /// Name used in logs and for the tuning file lookup
    pub name: String,

    /// Where readings come from
    pub sensor: RawSensor,

    /// Per-level bands
    pub levels: RawLevels,
}

/// Raw sensor source
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawSensor {
    /// A file holding a single integer reading, e.g. a sysfs thermal zone
    Sysfs { path: PathBuf },
}

/// One entry per thermal status level
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLevels {
    pub normal: RawLevel,
    pub warning: RawLevel,
    pub alert: RawLevel,
    pub fatal: RawLevel,
}

impl RawLevels {
    /// Levels in severity order
    pub fn ordered(&self) -> [(&'static str, &RawLevel); 4] {
        [
            ("normal", &self.normal),
            ("warning", &self.warning),
            ("alert", &self.alert),
            ("fatal", &self.fatal),
        ]
    }
}

/// Band and polling interval for one level
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RawLevel {
    pub min: i32,
    pub max: i32,
    /// Shortest poll interval in seconds
    pub mintime: u32,
    /// Longest poll interval in seconds (default: mintime + 10)
    pub maxtime: Option<u32>,
}
