//! Per-object runtime state

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thermo_api::{ObjectView, ThermalStatus};
use thermo_config::{ThermalObjectConfig, TuningOutcome, load_tuning};
use thermo_host_api::{SensorEventSender, TemperatureCompletion, TemperatureSensor, WaitRequest};
use thermo_util::{MonotonicInstant, ObjectId, tuning_file_path};
use tracing::{debug, warn};

use crate::classify;

/// Outcome of a poll's request step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new request is in flight
    Issued,
    /// The sensor could not start the request
    Refused,
    /// The previous request is still outstanding
    StillPending,
}

/// One registered sensor and its state
pub struct ThermalObject {
    id: ObjectId,
    config: ThermalObjectConfig,
    sensor: Arc<dyn TemperatureSensor>,
    status: ThermalStatus,
    request_pending: bool,
    request_seq: u64,
    requested_at: Option<MonotonicInstant>,
}

impl ThermalObject {
    pub fn new(id: ObjectId, config: ThermalObjectConfig, sensor: Arc<dyn TemperatureSensor>) -> Self {
        Self {
            id,
            config,
            sensor,
            status: ThermalStatus::Normal,
            request_pending: false,
            request_seq: 0,
            requested_at: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ThermalObjectConfig {
        &self.config
    }

    pub fn status(&self) -> ThermalStatus {
        self.status
    }

    pub fn request_pending(&self) -> bool {
        self.request_pending
    }

    /// Sequence number of the most recent request
    pub fn request_seq(&self) -> u64 {
        self.request_seq
    }

    /// Start a temperature request unless one is already outstanding.
    ///
    /// With a `timeout`, an outstanding request older than it is abandoned
    /// and replaced; its late response will no longer match.
    pub fn send_request(
        &mut self,
        tx: &SensorEventSender,
        timeout: Option<Duration>,
        now: MonotonicInstant,
    ) -> RequestOutcome {
        if self.request_pending {
            let expired = match (timeout, self.requested_at) {
                (Some(timeout), Some(at)) => now.duration_since(at) >= timeout,
                _ => false,
            };

            if !expired {
                debug!(object = %self.config.name, "Still waiting for temperature");
                return RequestOutcome::StillPending;
            }

            warn!(
                object = %self.config.name,
                request_seq = self.request_seq,
                "Temperature request timed out; retrying"
            );
        }

        debug!(object = %self.config.name, sensor = %self.sensor.describe(), "Requesting temperature");

        self.request_seq += 1;
        self.request_pending = true;
        self.requested_at = Some(now);

        let completion = TemperatureCompletion::new(self.id, self.request_seq, tx.clone());
        if self.sensor.request_temperature(completion) {
            RequestOutcome::Issued
        } else {
            self.request_pending = false;
            self.requested_at = None;
            debug!(object = %self.config.name, "Error requesting temperature");
            RequestOutcome::Refused
        }
    }

    /// Match a completion against the outstanding request, clearing the
    /// pending flag when it matches
    pub fn accept_response(&mut self, request_seq: u64) -> bool {
        if !self.request_pending || request_seq != self.request_seq {
            return false;
        }

        self.request_pending = false;
        self.requested_at = None;
        true
    }

    /// Wake request for the bands of the current status
    pub fn wait_request(&self) -> WaitRequest {
        let band = &self.config.levels[self.status.index()];
        WaitRequest::new(self.id, band.min_interval(), band.max_interval())
    }

    /// Re-read this object's tuning file from `dir`
    pub fn reload_tuning(&mut self, dir: &Path) {
        let path = tuning_file_path(dir, &self.config.name);

        if let TuningOutcome::Applied(levels) =
            load_tuning(&path, &self.config.name, &self.config.levels)
        {
            self.config.levels = levels;
        }
    }

    /// Start from `status` instead of normal; used when a reload replaces
    /// an object that was already classified
    pub fn inherit_status(&mut self, status: ThermalStatus) {
        self.status = status;
    }

    /// Classify a normalized temperature, returning the previous status
    pub fn update_status(&mut self, temperature: i32) -> ThermalStatus {
        let previous = self.status;
        self.status = classify(previous, temperature, &self.config.levels);
        previous
    }

    pub fn view(&self) -> ObjectView {
        ObjectView {
            id: self.id,
            name: self.config.name.clone(),
            status: self.status,
            request_pending: self.request_pending,
            levels: self.config.levels,
        }
    }
}

impl std::fmt::Debug for ThermalObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThermalObject")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("status", &self.status)
            .field("request_pending", &self.request_pending)
            .field("request_seq", &self.request_seq)
            .finish()
    }
}
