//! Temperature log trait

use thermo_api::ThermalStatus;

use crate::StoreResult;

/// One classified reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemperatureRecord {
    /// Name of the thermal object
    pub object: String,
    /// Wall-clock seconds since the unix epoch
    pub unix_time: i64,
    /// Normalized temperature in degrees Celsius
    pub temperature: i32,
    /// Status of the object after classification
    pub status: ThermalStatus,
}

impl TemperatureRecord {
    pub fn new(object: impl Into<String>, temperature: i32, status: ThermalStatus) -> Self {
        Self {
            object: object.into(),
            unix_time: thermo_util::unix_time(),
            temperature,
            status,
        }
    }
}

/// Sink for temperature history
pub trait TemperatureLog: Send + Sync {
    /// Append a record
    fn append(&self, record: &TemperatureRecord) -> StoreResult<()>;
}
