//! Thermal object registry, aggregation and notification

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thermo_api::{ObjectView, ThermalStatus};
use thermo_config::{DaemonConfig, ThermalObjectConfig};
use thermo_host_api::{SensorEventSender, TemperatureSensor};
use thermo_store::{TemperatureLog, TemperatureRecord};
use thermo_util::{MonotonicInstant, ObjectId, default_tuning_dir};
use tracing::{debug, error, info, warn};

use crate::{CoreEvent, ThermalObject, normalize_temperature};

/// Runtime options of a manager
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Directory holding `temp_<name>` tuning files
    pub tuning_dir: PathBuf,
    /// Re-read tuning files before each classification
    pub tuning_enabled: bool,
    /// Abandon a request outstanding for longer than this
    pub request_timeout: Option<Duration>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            tuning_dir: default_tuning_dir(),
            tuning_enabled: false,
            request_timeout: None,
        }
    }
}

impl From<&DaemonConfig> for ManagerSettings {
    fn from(config: &DaemonConfig) -> Self {
        Self {
            tuning_dir: config.tuning_dir.clone(),
            tuning_enabled: config.tuning_enabled,
            request_timeout: config.request_timeout,
        }
    }
}

/// Owns every registered thermal object and the aggregate status derived
/// from them.
///
/// All methods run to completion and return the events the caller must
/// dispatch; the manager itself never waits.
pub struct ThermalManager {
    settings: ManagerSettings,
    objects: Vec<ThermalObject>,
    aggregate: ThermalStatus,
    overheated: bool,
    sensor_tx: SensorEventSender,
    temperature_log: Option<Arc<dyn TemperatureLog>>,
}

impl ThermalManager {
    /// Create a manager whose sensor completions are posted to `sensor_tx`
    pub fn new(settings: ManagerSettings, sensor_tx: SensorEventSender) -> Self {
        info!(
            tuning_enabled = settings.tuning_enabled,
            request_timeout = ?settings.request_timeout,
            "Thermal manager initialized"
        );

        Self {
            settings,
            objects: Vec::new(),
            aggregate: ThermalStatus::Normal,
            overheated: false,
            sensor_tx,
            temperature_log: None,
        }
    }

    /// Record every classified reading to `log`
    pub fn with_temperature_log(mut self, log: Arc<dyn TemperatureLog>) -> Self {
        self.temperature_log = Some(log);
        self
    }

    /// Add an object and run its first poll.
    ///
    /// The manager keeps its own copy of `config`; later changes to the
    /// caller's value, and tuning applied to the copy, do not cross over.
    pub fn register(
        &mut self,
        config: &ThermalObjectConfig,
        sensor: Arc<dyn TemperatureSensor>,
    ) -> (ObjectId, Vec<CoreEvent>) {
        let id = ObjectId::next();

        info!(object = %config.name, %id, sensor = %sensor.describe(), "Registering thermal object");

        self.objects
            .push(ThermalObject::new(id, config.clone(), sensor));

        let events = self.poll(id, MonotonicInstant::now());
        (id, events)
    }

    /// Remove an object.
    ///
    /// Its armed wake is cancelled and any late response is ignored. The
    /// aggregate is recomputed without it. Returns `None` for unknown ids.
    pub fn unregister(&mut self, id: ObjectId) -> Option<Vec<CoreEvent>> {
        let index = self.objects.iter().position(|o| o.id() == id)?;
        let object = self.objects.remove(index);

        info!(object = %object.name(), %id, "Unregistered thermal object");

        let mut events = vec![CoreEvent::WaitCancelled { target: id }];
        events.extend(self.update_aggregate());
        Some(events)
    }

    /// Swap the whole registry for a new set of objects.
    ///
    /// A new object whose name matches a replaced one starts from that
    /// object's status, so a reload does not reset a hot device to normal.
    /// The aggregate is recomputed once, after the swap.
    pub fn replace_all<'a, I>(&mut self, objects: I) -> Vec<CoreEvent>
    where
        I: IntoIterator<Item = (&'a ThermalObjectConfig, Arc<dyn TemperatureSensor>)>,
    {
        let previous = std::mem::take(&mut self.objects);
        let mut events: Vec<CoreEvent> = previous
            .iter()
            .map(|o| CoreEvent::WaitCancelled { target: o.id() })
            .collect();

        for (config, sensor) in objects {
            let id = ObjectId::next();
            let mut object = ThermalObject::new(id, config.clone(), sensor);

            if let Some(old) = previous.iter().find(|o| o.name() == config.name) {
                object.inherit_status(old.status());
            }

            info!(
                object = %config.name,
                %id,
                status = %object.status(),
                "Registering thermal object"
            );

            self.objects.push(object);
            events.extend(self.poll(id, MonotonicInstant::now()));
        }

        info!(
            removed = previous.len(),
            registered = self.objects.len(),
            "Thermal objects replaced"
        );

        events.extend(self.update_aggregate());
        events
    }

    /// Run a poll cycle for `id`; the handler for an expired wake.
    ///
    /// A request is issued unless one is outstanding, and the next wake is
    /// requested either way.
    pub fn poll(&mut self, id: ObjectId, now: MonotonicInstant) -> Vec<CoreEvent> {
        let timeout = self.settings.request_timeout;
        let tx = self.sensor_tx.clone();
        let Some(object) = self.object_mut(id) else {
            debug!(%id, "Wakeup for unknown thermal object");
            return Vec::new();
        };

        debug!(object = %object.name(), "Check thermal object");
        object.send_request(&tx, timeout, now);

        vec![CoreEvent::WaitRequested(object.wait_request())]
    }

    /// Handle a completed temperature request.
    ///
    /// `None` is a failed read and changes nothing but the pending flag.
    pub fn receive_temperature(
        &mut self,
        id: ObjectId,
        request_seq: u64,
        reading: Option<i32>,
    ) -> Vec<CoreEvent> {
        let tuning_dir = self
            .settings
            .tuning_enabled
            .then(|| self.settings.tuning_dir.clone());

        let Some(object) = self.object_mut(id) else {
            debug!(%id, request_seq, "Temperature for unknown thermal object dropped");
            return Vec::new();
        };

        if !object.accept_response(request_seq) {
            debug!(
                object = %object.name(),
                request_seq,
                current_seq = object.request_seq(),
                "Stale temperature response dropped"
            );
            return Vec::new();
        }

        let Some(raw) = reading else {
            debug!(object = %object.name(), "Temperature request failed");
            return Vec::new();
        };

        if let Some(dir) = tuning_dir {
            object.reload_tuning(&dir);
        }

        let temperature = normalize_temperature(raw);
        let previous = object.update_status(temperature);
        let status = object.status();

        debug!(object = %object.name(), raw, temperature, %status, "Temperature");

        let record = TemperatureRecord::new(object.name(), temperature, status);

        let events = if status != previous {
            info!(object = %record.object, from = %previous, to = %status, "Thermal object status changed");
            self.update_aggregate()
        } else {
            Vec::new()
        };

        if let Some(log) = &self.temperature_log {
            if let Err(e) = log.append(&record) {
                warn!(error = %e, "Failed to write temperature log");
            }
        }

        events
    }

    /// Recompute the aggregate and produce notifications if it changed
    fn update_aggregate(&mut self) -> Vec<CoreEvent> {
        let previous = self.aggregate;
        self.aggregate = self
            .objects
            .iter()
            .map(ThermalObject::status)
            .max()
            .unwrap_or(ThermalStatus::Normal);

        if self.aggregate == previous {
            return Vec::new();
        }

        info!(status = %self.aggregate, "Thermal status: {}", self.aggregate);

        let mut events = vec![CoreEvent::StateChanged {
            status: self.aggregate,
        }];

        if self.aggregate == ThermalStatus::Fatal {
            self.overheated = true;
            error!("Device overheated");
            events.push(CoreEvent::OverheatChanged { overheated: true });
        } else if self.overheated {
            self.overheated = false;
            info!("Device no longer overheated");
            events.push(CoreEvent::OverheatChanged { overheated: false });
        }

        events
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut ThermalObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// Current aggregate status
    pub fn thermal_state(&self) -> ThermalStatus {
        self.aggregate
    }

    pub fn is_overheated(&self) -> bool {
        self.overheated
    }

    /// Snapshot of registered objects in registration order
    pub fn objects(&self) -> Vec<ObjectView> {
        self.objects.iter().map(ThermalObject::view).collect()
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(ThermalObject::id).collect()
    }

    pub fn object(&self, id: ObjectId) -> Option<&ThermalObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of objects with a request in flight
    pub fn pending_requests(&self) -> usize {
        self.objects.iter().filter(|o| o.request_pending()).count()
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Replace runtime options; takes effect from the next poll or response
    pub fn update_settings(&mut self, settings: ManagerSettings) {
        info!(
            tuning_enabled = settings.tuning_enabled,
            request_timeout = ?settings.request_timeout,
            "Thermal manager settings updated"
        );
        self.settings = settings;
    }

    pub fn tuning_enabled(&self) -> bool {
        self.settings.tuning_enabled
    }

    pub fn set_tuning_enabled(&mut self, enabled: bool) {
        if enabled != self.settings.tuning_enabled {
            info!(enabled, "Thermal tuning mode changed");
        }
        self.settings.tuning_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermo_api::LevelBand;
    use thermo_host_api::{MockSensor, SensorEvent, SensorEventReceiver, WaitRequest};
    use thermo_store::MemoryTemperatureLog;
    use tokio::sync::mpsc;

    fn levels() -> [LevelBand; 4] {
        [
            LevelBand::new(0, 50, 60, 70),
            LevelBand::new(40, 70, 30, 40),
            LevelBand::new(60, 90, 10, 20),
            LevelBand::new(80, 999, 5, 15),
        ]
    }

    fn make_manager(settings: ManagerSettings) -> (ThermalManager, SensorEventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ThermalManager::new(settings, tx), rx)
    }

    /// Complete the sensor's next request with `reading` and feed the
    /// completion back into the manager
    fn answer(
        manager: &mut ThermalManager,
        rx: &mut SensorEventReceiver,
        sensor: &MockSensor,
        reading: Option<i32>,
    ) -> Vec<CoreEvent> {
        assert!(sensor.complete_next(reading));
        let SensorEvent::Temperature {
            object,
            request_seq,
            reading,
        } = rx.try_recv().unwrap();
        manager.receive_temperature(object, request_seq, reading)
    }

    fn state_changes(events: &[CoreEvent]) -> Vec<ThermalStatus> {
        events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::StateChanged { status } => Some(*status),
                _ => None,
            })
            .collect()
    }

    fn overheats(events: &[CoreEvent]) -> Vec<bool> {
        events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::OverheatChanged { overheated } => Some(*overheated),
                _ => None,
            })
            .collect()
    }

    fn assert_aggregate_is_max(manager: &ThermalManager) {
        let max = manager
            .objects()
            .iter()
            .map(|o| o.status)
            .max()
            .unwrap_or(ThermalStatus::Normal);
        assert_eq!(manager.thermal_state(), max);
    }

    #[test]
    fn test_register_polls_immediately() {
        let (mut manager, _rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());

        let (id, events) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        assert_eq!(sensor.request_count(), 1);
        assert_eq!(
            events,
            vec![CoreEvent::WaitRequested(WaitRequest::new(
                id,
                Duration::from_secs(60),
                Duration::from_secs(70)
            ))]
        );
        assert_eq!(manager.pending_requests(), 1);
        assert_eq!(manager.thermal_state(), ThermalStatus::Normal);
    }

    #[test]
    fn test_empty_registry_is_normal() {
        let (manager, _rx) = make_manager(ManagerSettings::default());
        assert_eq!(manager.thermal_state(), ThermalStatus::Normal);
        assert!(manager.objects().is_empty());
    }

    #[test]
    fn test_fatal_reading_notifies_once() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        let events = answer(&mut manager, &mut rx, &sensor, Some(95));

        assert_eq!(state_changes(&events), vec![ThermalStatus::Fatal]);
        assert_eq!(overheats(&events), vec![true]);
        assert_eq!(manager.thermal_state(), ThermalStatus::Fatal);
        assert!(manager.is_overheated());
    }

    #[test]
    fn test_next_wait_uses_new_level() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        answer(&mut manager, &mut rx, &sensor, Some(75_000));
        let events = manager.poll(id, MonotonicInstant::now());

        assert_eq!(
            events,
            vec![CoreEvent::WaitRequested(WaitRequest::new(
                id,
                Duration::from_secs(10),
                Duration::from_secs(20)
            ))]
        );
    }

    #[test]
    fn test_failed_reading_changes_nothing() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        answer(&mut manager, &mut rx, &sensor, Some(65));
        assert_eq!(manager.thermal_state(), ThermalStatus::Warning);

        manager.poll(id, MonotonicInstant::now());
        let events = answer(&mut manager, &mut rx, &sensor, None);

        assert!(events.is_empty());
        assert_eq!(manager.thermal_state(), ThermalStatus::Warning);
        assert_eq!(manager.object(id).unwrap().status(), ThermalStatus::Warning);
        assert!(!manager.object(id).unwrap().request_pending());
    }

    #[test]
    fn test_no_emission_when_aggregate_unchanged() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let hot = Arc::new(MockSensor::new());
        let cool = Arc::new(MockSensor::new());
        manager.register(&ThermalObjectConfig::new("hot", levels()), hot.clone());
        let (cool_id, _) = manager.register(&ThermalObjectConfig::new("cool", levels()), cool.clone());

        let events = answer(&mut manager, &mut rx, &hot, Some(65));
        assert_eq!(state_changes(&events), vec![ThermalStatus::Warning]);
        let events = answer(&mut manager, &mut rx, &cool, Some(20));
        assert!(events.is_empty());

        // The second object joins WARNING; the aggregate stays put
        manager.poll(cool_id, MonotonicInstant::now());
        let events = answer(&mut manager, &mut rx, &cool, Some(65));

        assert!(events.is_empty());
        assert_eq!(manager.object(cool_id).unwrap().status(), ThermalStatus::Warning);
        assert_eq!(manager.thermal_state(), ThermalStatus::Warning);
    }

    #[test]
    fn test_overheat_cleared_when_leaving_fatal() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        answer(&mut manager, &mut rx, &sensor, Some(95));
        manager.poll(id, MonotonicInstant::now());
        let events = answer(&mut manager, &mut rx, &sensor, Some(70));

        assert_eq!(state_changes(&events), vec![ThermalStatus::Alert]);
        assert_eq!(overheats(&events), vec![false]);
        assert!(!manager.is_overheated());

        // A further drop emits a state change but no overheat broadcast
        manager.poll(id, MonotonicInstant::now());
        let events = answer(&mut manager, &mut rx, &sensor, Some(10));
        assert_eq!(state_changes(&events), vec![ThermalStatus::Normal]);
        assert!(overheats(&events).is_empty());
    }

    #[test]
    fn test_fatal_reentry_rebroadcasts_overheat() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        let mut broadcasts = Vec::new();
        for reading in [95, 75, 95] {
            manager.poll(id, MonotonicInstant::now());
            broadcasts.extend(overheats(&answer(&mut manager, &mut rx, &sensor, Some(reading))));
        }

        assert_eq!(broadcasts, vec![true, false, true]);
    }

    #[test]
    fn test_poll_while_pending_still_rearms() {
        let (mut manager, _rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        let events = manager.poll(id, MonotonicInstant::now());

        assert_eq!(sensor.request_count(), 1);
        assert!(matches!(events.as_slice(), [CoreEvent::WaitRequested(w)] if w.target == id));
    }

    #[test]
    fn test_refused_request_is_retried_next_poll() {
        let (mut manager, _rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::refusing());
        let (id, events) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        assert_eq!(events.len(), 1);
        assert_eq!(manager.pending_requests(), 0);

        sensor.set_refuse(false);
        manager.poll(id, MonotonicInstant::now());
        assert_eq!(sensor.request_count(), 1);
        assert_eq!(manager.pending_requests(), 1);
    }

    #[test]
    fn test_lost_request_blocks_without_timeout() {
        let (mut manager, _rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());
        sensor.lose_next();

        let later = MonotonicInstant::now() + Duration::from_secs(86_400);
        manager.poll(id, later);

        assert_eq!(sensor.request_count(), 1);
    }

    #[test]
    fn test_timeout_retries_and_drops_stale_response() {
        let (mut manager, mut rx) = make_manager(ManagerSettings {
            request_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        let later = MonotonicInstant::now() + Duration::from_secs(31);
        manager.poll(id, later);
        assert_eq!(sensor.request_count(), 2);

        // The abandoned first request answers late
        let events = answer(&mut manager, &mut rx, &sensor, Some(95));
        assert!(events.is_empty());
        assert_eq!(manager.thermal_state(), ThermalStatus::Normal);
        assert!(manager.object(id).unwrap().request_pending());

        let events = answer(&mut manager, &mut rx, &sensor, Some(95));
        assert_eq!(state_changes(&events), vec![ThermalStatus::Fatal]);
    }

    #[test]
    fn test_register_copies_config() {
        let (mut manager, _rx) = make_manager(ManagerSettings::default());
        let mut config = ThermalObjectConfig::new("core", levels());
        let snapshot = config.clone();

        let (id, _) = manager.register(&config, Arc::new(MockSensor::new()));
        assert_eq!(config, snapshot);

        config.levels[0].max = 1;
        assert_eq!(manager.object(id).unwrap().config().levels, levels());
    }

    #[test]
    fn test_names_may_collide() {
        let (mut manager, _rx) = make_manager(ManagerSettings::default());
        let config = ThermalObjectConfig::new("core", levels());

        let (a, _) = manager.register(&config, Arc::new(MockSensor::new()));
        let (b, _) = manager.register(&config, Arc::new(MockSensor::new()));

        assert_ne!(a, b);
        assert_eq!(manager.object_count(), 2);
    }

    #[test]
    fn test_tuning_applied_before_classification() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("temp_core"),
            "0, 30, 100\n25, 40, 50\n35, 60, 20\n55, 200, 2\n",
        )
        .unwrap();

        let (mut manager, mut rx) = make_manager(ManagerSettings {
            tuning_dir: dir.path().to_path_buf(),
            tuning_enabled: true,
            request_timeout: None,
        });
        let sensor = Arc::new(MockSensor::new());
        let config = ThermalObjectConfig::new("core", levels());
        let (id, _) = manager.register(&config, sensor.clone());

        // 45 is NORMAL under the configured bands but ALERT once tuned
        let events = answer(&mut manager, &mut rx, &sensor, Some(45));

        assert_eq!(state_changes(&events), vec![ThermalStatus::Alert]);
        assert_eq!(
            manager.object(id).unwrap().config().levels[2],
            LevelBand::new(35, 60, 20, 30)
        );
        assert_eq!(config.levels, levels());
    }

    #[test]
    fn test_malformed_tuning_leaves_levels_identical() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("temp_core"), "0, 30, 100\n25, forty, 50\n").unwrap();

        let (mut manager, mut rx) = make_manager(ManagerSettings {
            tuning_dir: dir.path().to_path_buf(),
            tuning_enabled: true,
            request_timeout: None,
        });
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());
        let before = manager.object(id).unwrap().config().clone();

        answer(&mut manager, &mut rx, &sensor, Some(45));

        assert_eq!(manager.object(id).unwrap().config(), &before);
        assert_eq!(manager.thermal_state(), ThermalStatus::Normal);
    }

    #[test]
    fn test_tuning_ignored_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("temp_core"),
            "0, 30, 100\n25, 40, 50\n35, 60, 20\n55, 200, 2\n",
        )
        .unwrap();

        let (mut manager, mut rx) = make_manager(ManagerSettings {
            tuning_dir: dir.path().to_path_buf(),
            ..Default::default()
        });
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        answer(&mut manager, &mut rx, &sensor, Some(45));
        assert_eq!(manager.object(id).unwrap().config().levels, levels());

        manager.set_tuning_enabled(true);
        manager.poll(id, MonotonicInstant::now());
        answer(&mut manager, &mut rx, &sensor, Some(45));
        assert_eq!(manager.thermal_state(), ThermalStatus::Alert);
    }

    #[test]
    fn test_unregister_recomputes_aggregate() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let hot = Arc::new(MockSensor::new());
        let cool = Arc::new(MockSensor::new());
        let (hot_id, _) = manager.register(&ThermalObjectConfig::new("hot", levels()), hot.clone());
        manager.register(&ThermalObjectConfig::new("cool", levels()), cool.clone());

        answer(&mut manager, &mut rx, &hot, Some(95));
        assert_eq!(manager.thermal_state(), ThermalStatus::Fatal);

        let events = manager.unregister(hot_id).unwrap();

        assert_eq!(events[0], CoreEvent::WaitCancelled { target: hot_id });
        assert_eq!(state_changes(&events), vec![ThermalStatus::Normal]);
        assert_eq!(overheats(&events), vec![false]);
        assert_eq!(manager.object_count(), 1);
        assert!(manager.unregister(hot_id).is_none());
    }

    #[test]
    fn test_events_for_removed_object_are_ignored() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());
        manager.unregister(id);

        assert!(answer(&mut manager, &mut rx, &sensor, Some(95)).is_empty());
        assert!(manager.poll(id, MonotonicInstant::now()).is_empty());
        assert_eq!(manager.thermal_state(), ThermalStatus::Normal);
    }

    #[test]
    fn test_replace_all_keeps_status_of_same_name() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let old_sensor = Arc::new(MockSensor::new());
        let (old_id, _) =
            manager.register(&ThermalObjectConfig::new("core", levels()), old_sensor.clone());
        answer(&mut manager, &mut rx, &old_sensor, Some(95));
        assert!(manager.is_overheated());
        manager.poll(old_id, MonotonicInstant::now());

        let config = ThermalObjectConfig::new("core", levels());
        let new_sensor = Arc::new(MockSensor::new());
        let events = manager.replace_all([(&config, new_sensor.clone() as Arc<dyn TemperatureSensor>)]);

        let new_id = manager.object_ids()[0];
        assert_ne!(new_id, old_id);
        assert_eq!(
            events,
            vec![
                CoreEvent::WaitCancelled { target: old_id },
                CoreEvent::WaitRequested(WaitRequest::new(
                    new_id,
                    Duration::from_secs(5),
                    Duration::from_secs(15)
                )),
            ]
        );
        assert_eq!(manager.thermal_state(), ThermalStatus::Fatal);
        assert!(manager.is_overheated());
        assert_eq!(new_sensor.request_count(), 1);

        // Reading from the replaced sensor arrives late
        assert!(answer(&mut manager, &mut rx, &old_sensor, Some(20)).is_empty());
        assert!(answer(&mut manager, &mut rx, &new_sensor, Some(95)).is_empty());
    }

    #[test]
    fn test_replace_all_drops_removed_objects() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let hot = Arc::new(MockSensor::new());
        manager.register(&ThermalObjectConfig::new("hot", levels()), hot.clone());
        answer(&mut manager, &mut rx, &hot, Some(65));
        assert_eq!(manager.thermal_state(), ThermalStatus::Warning);

        let config = ThermalObjectConfig::new("other", levels());
        let events = manager.replace_all([(&config, Arc::new(MockSensor::new()) as Arc<dyn TemperatureSensor>)]);

        assert_eq!(state_changes(&events), vec![ThermalStatus::Normal]);
        assert!(overheats(&events).is_empty());
        assert_eq!(manager.objects()[0].status, ThermalStatus::Normal);
        assert_aggregate_is_max(&manager);
    }

    #[test]
    fn test_temperature_log_records_each_reading() {
        let log = Arc::new(MemoryTemperatureLog::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = ThermalManager::new(ManagerSettings::default(), tx)
            .with_temperature_log(log.clone());
        let sensor = Arc::new(MockSensor::new());
        let (id, _) = manager.register(&ThermalObjectConfig::new("core", levels()), sensor.clone());

        answer(&mut manager, &mut rx, &sensor, Some(318));
        manager.poll(id, MonotonicInstant::now());
        answer(&mut manager, &mut rx, &sensor, None);
        manager.poll(id, MonotonicInstant::now());
        answer(&mut manager, &mut rx, &sensor, Some(95_000));

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].temperature, 45);
        assert_eq!(records[0].status, ThermalStatus::Normal);
        assert_eq!(records[1].temperature, 95);
        assert_eq!(records[1].status, ThermalStatus::Fatal);
        assert_eq!(records[1].object, "core");
    }

    #[test]
    fn test_aggregate_tracks_max_through_random_walk() {
        let (mut manager, mut rx) = make_manager(ManagerSettings::default());
        let sensors: Vec<_> = (0..3).map(|_| Arc::new(MockSensor::new())).collect();
        let ids: Vec<_> = sensors
            .iter()
            .enumerate()
            .map(|(i, s)| {
                manager
                    .register(&ThermalObjectConfig::new(format!("obj{}", i), levels()), s.clone())
                    .0
            })
            .collect();

        // Deterministic pseudo-random readings
        let mut seed: u32 = 12345;
        let mut previous = manager.thermal_state();

        for step in 0..300 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let which = (seed >> 16) as usize % 3;
            let reading = ((seed >> 8) % 120) as i32;
            let reading = if step % 17 == 0 { None } else { Some(reading) };

            let events = answer(&mut manager, &mut rx, &sensors[which], reading);
            manager.poll(ids[which], MonotonicInstant::now());

            assert_aggregate_is_max(&manager);

            let changes = state_changes(&events);
            if manager.thermal_state() == previous {
                assert!(changes.is_empty());
            } else {
                assert_eq!(changes, vec![manager.thermal_state()]);
            }
            previous = manager.thermal_state();
        }
    }
}
