//! Validated settings structures

use crate::schema::{RawConfig, RawDaemonConfig, RawLevel, RawReaperConfig, RawSensor, RawThermalObject};
use crate::tuning::TUNING_MAXTIME_SLACK;
use std::path::PathBuf;
use std::time::Duration;
use thermo_api::{LevelBand, LevelTable};
use thermo_util::{default_socket_path, default_tuning_dir};

/// Validated settings ready for use by the daemon
#[derive(Debug, Clone)]
pub struct Settings {
    pub daemon: DaemonConfig,
    pub reaper: ReaperConfig,
    pub objects: Vec<ObjectDefinition>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            reaper: ReaperConfig::from_raw(raw.reaper),
            objects: raw.objects.into_iter().map(ObjectDefinition::from_raw).collect(),
        }
    }
}

/// Immutable configuration of one thermal object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermalObjectConfig {
    pub name: String,
    pub levels: LevelTable,
}

impl ThermalObjectConfig {
    pub fn new(name: impl Into<String>, levels: LevelTable) -> Self {
        Self {
            name: name.into(),
            levels,
        }
    }
}

/// Where a thermal object reads its temperature from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorSpec {
    Sysfs { path: PathBuf },
}

/// A configured object: its thresholds plus its sensor source
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub config: ThermalObjectConfig,
    pub sensor: SensorSpec,
}

impl ObjectDefinition {
    fn from_raw(raw: RawThermalObject) -> Self {
        let levels = raw.levels.ordered().map(|(_, level)| convert_level(level));

        let sensor = match raw.sensor {
            RawSensor::Sysfs { path } => SensorSpec::Sysfs { path },
        };

        Self {
            config: ThermalObjectConfig::new(raw.name, levels),
            sensor,
        }
    }
}

fn convert_level(raw: &RawLevel) -> LevelBand {
    LevelBand::new(
        raw.min,
        raw.max,
        raw.mintime,
        raw.maxtime
            .unwrap_or_else(|| raw.mintime.saturating_add(TUNING_MAXTIME_SLACK)),
    )
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,
    pub tuning_dir: PathBuf,
    pub tuning_enabled: bool,
    pub temperature_log: Option<PathBuf>,
    /// None keeps a pending request outstanding until it completes
    pub request_timeout: Option<Duration>,
    pub heartbeat_period: Duration,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            tuning_dir: raw.tuning_dir.unwrap_or_else(default_tuning_dir),
            tuning_enabled: raw.tuning_enabled.unwrap_or(false),
            temperature_log: raw.temperature_log,
            request_timeout: raw.request_timeout_seconds.map(Duration::from_secs),
            heartbeat_period: Duration::from_secs(
                raw.heartbeat_period_seconds
                    .unwrap_or(DEFAULT_HEARTBEAT_PERIOD_SECS),
            ),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_raw(RawDaemonConfig::default())
    }
}

pub const DEFAULT_HEARTBEAT_PERIOD_SECS: u64 = 30;

/// Temp reaper configuration
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    pub enabled: bool,
    pub helper_path: PathBuf,
    pub target_dir: PathBuf,
    pub users: Vec<String>,
    pub priority: i32,
    pub watch_mounts: Vec<PathBuf>,
    pub min_free_percent: u8,
    pub check_interval: Duration,
}

impl ReaperConfig {
    fn from_raw(raw: RawReaperConfig) -> Self {
        Self {
            enabled: raw.enabled.unwrap_or(true),
            helper_path: raw
                .helper_path
                .unwrap_or_else(|| PathBuf::from("/usr/sbin/rpdir")),
            target_dir: raw.target_dir.unwrap_or_else(|| PathBuf::from("/var/tmp")),
            users: raw
                .users
                .unwrap_or_else(|| vec!["user".into(), "nobody".into()]),
            priority: raw.priority.unwrap_or(5),
            watch_mounts: raw
                .watch_mounts
                .unwrap_or_else(|| vec![PathBuf::from("/")]),
            min_free_percent: raw.min_free_percent.unwrap_or(10),
            check_interval: Duration::from_secs(raw.check_interval_seconds.unwrap_or(60)),
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self::from_raw(RawReaperConfig::default())
    }
}
