//! In-memory temperature log for tests

use std::sync::Mutex;

use crate::{StoreError, StoreResult, TemperatureLog, TemperatureRecord};

/// Keeps every record in memory
#[derive(Default)]
pub struct MemoryTemperatureLog {
    records: Mutex<Vec<TemperatureRecord>>,
}

impl MemoryTemperatureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TemperatureRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl TemperatureLog for MemoryTemperatureLog {
    fn append(&self, record: &TemperatureRecord) -> StoreResult<()> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory log lock poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}
