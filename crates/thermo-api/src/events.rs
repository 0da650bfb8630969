//! Event types for thermod -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{ThermalStatus, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: thermo_util::now(),
            payload,
        }
    }
}

/// All possible events from the daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Aggregate thermal state changed
    StateChangeInd { state: ThermalStatus },

    /// Device entered or left the overheated (fatal) condition
    ThermalOverheat { overheated: bool },

    /// Daemon is shutting down
    Shutdown,
}
