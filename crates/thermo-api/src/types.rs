//! Shared types for the thermod API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thermo_util::ObjectId;

/// Number of thermal status levels
pub const LEVEL_COUNT: usize = 4;

/// Thermal severity, ordered from coolest to hottest.
///
/// Classification and aggregation compare levels, so the declaration order
/// is significant.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ThermalStatus {
    #[default]
    Normal,
    Warning,
    Alert,
    Fatal,
}

impl ThermalStatus {
    pub const ALL: [ThermalStatus; LEVEL_COUNT] = [
        ThermalStatus::Normal,
        ThermalStatus::Warning,
        ThermalStatus::Alert,
        ThermalStatus::Fatal,
    ];

    /// Name carried by `get_thermal_state` and `state_change_ind`
    pub fn name(self) -> &'static str {
        match self {
            ThermalStatus::Normal => "normal",
            ThermalStatus::Warning => "warning",
            ThermalStatus::Alert => "alert",
            ThermalStatus::Fatal => "fatal",
        }
    }

    /// Upper-case name written to the temperature log
    pub fn log_name(self) -> &'static str {
        match self {
            ThermalStatus::Normal => "NORMAL",
            ThermalStatus::Warning => "WARNING",
            ThermalStatus::Alert => "ALERT",
            ThermalStatus::Fatal => "FATAL",
        }
    }

    /// Position in the level table
    pub fn index(self) -> usize {
        self as usize
    }

    /// One level hotter, saturating at `Fatal`
    pub fn raise(self) -> Self {
        match self {
            ThermalStatus::Normal => ThermalStatus::Warning,
            ThermalStatus::Warning => ThermalStatus::Alert,
            ThermalStatus::Alert | ThermalStatus::Fatal => ThermalStatus::Fatal,
        }
    }

    /// One level cooler, saturating at `Normal`
    pub fn lower(self) -> Self {
        match self {
            ThermalStatus::Normal | ThermalStatus::Warning => ThermalStatus::Normal,
            ThermalStatus::Alert => ThermalStatus::Warning,
            ThermalStatus::Fatal => ThermalStatus::Alert,
        }
    }
}

impl fmt::Display for ThermalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Temperature band and polling interval for one thermal status level.
///
/// `min`/`max` are in degrees Celsius (inclusive); `mintime`/`maxtime` bound
/// the wake interval in seconds while the object sits at this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBand {
    pub min: i32,
    pub max: i32,
    pub mintime: u32,
    pub maxtime: u32,
}

impl LevelBand {
    pub fn new(min: i32, max: i32, mintime: u32, maxtime: u32) -> Self {
        Self {
            min,
            max,
            mintime,
            maxtime,
        }
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.mintime))
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.maxtime))
    }
}

/// Per-level table, indexed by `ThermalStatus::index`
pub type LevelTable = [LevelBand; LEVEL_COUNT];

/// View of one registered thermal object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectView {
    pub id: ObjectId,
    pub name: String,
    pub status: ThermalStatus,
    pub request_pending: bool,
    pub levels: LevelTable,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub object_count: usize,
    pub pending_requests: usize,
    pub tuning_enabled: bool,
    pub reaper_running: bool,
}

/// Role of a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// Read-only: query state, subscribe to events
    Observer,
    /// Root or the daemon's own user
    Admin,
}

impl ClientRole {
    pub fn can_set_tuning(&self) -> bool {
        matches!(self, ClientRole::Admin)
    }
}
