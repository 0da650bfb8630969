//! Sysfs temperature sensors

use std::path::{Path, PathBuf};
use thermo_host_api::{HostError, HostResult, TemperatureCompletion, TemperatureSensor};
use tracing::{debug, warn};

/// Reads a raw integer temperature from a sysfs attribute such as
/// `/sys/class/thermal/thermal_zone0/temp`.
///
/// The value is passed on unscaled; unit detection happens in the core.
#[derive(Debug, Clone)]
pub struct SysfsSensor {
    path: PathBuf,
}

impl SysfsSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemperatureSensor for SysfsSensor {
    fn request_temperature(&self, completion: TemperatureCompletion) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(path = %self.path.display(), "No runtime to read sensor on");
            return false;
        };

        let path = self.path.clone();
        runtime.spawn_blocking(move || {
            let reading = match read_raw_temperature(&path) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Sensor read failed");
                    None
                }
            };
            completion.complete(reading);
        });

        true
    }

    fn describe(&self) -> String {
        format!("sysfs:{}", self.path.display())
    }
}

/// Read and parse one integer from a sysfs attribute
pub fn read_raw_temperature(path: &Path) -> HostResult<i32> {
    let content = std::fs::read_to_string(path)?;
    let content = content.trim();

    content.parse::<i32>().map_err(|_| {
        HostError::SensorUnavailable(format!(
            "{}: expected an integer, got '{}'",
            path.display(),
            content
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermo_host_api::SensorEvent;
    use thermo_util::ObjectId;
    use tokio::sync::mpsc;

    #[test]
    fn parse_millidegrees() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "54321\n").unwrap();

        assert_eq!(read_raw_temperature(&path).unwrap(), 54321);
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "hot\n").unwrap();

        assert!(matches!(
            read_raw_temperature(&path),
            Err(HostError::SensorUnavailable(_))
        ));
        assert!(read_raw_temperature(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn refuses_without_runtime() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let sensor = SysfsSensor::new("/nonexistent");

        assert!(!sensor.request_temperature(TemperatureCompletion::new(ObjectId::from_raw(1), 1, tx)));
    }

    #[tokio::test]
    async fn completes_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "318\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sensor = SysfsSensor::new(&path);
        let object = ObjectId::from_raw(9);

        assert!(sensor.request_temperature(TemperatureCompletion::new(object, 4, tx)));

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SensorEvent::Temperature {
                object,
                request_seq: 4,
                reading: Some(318),
            }
        );
    }

    #[tokio::test]
    async fn missing_file_completes_with_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sensor = SysfsSensor::new("/nonexistent/thermal/temp");

        assert!(sensor.request_temperature(TemperatureCompletion::new(ObjectId::from_raw(1), 1, tx)));

        let SensorEvent::Temperature { reading, .. } = rx.recv().await.unwrap();
        assert_eq!(reading, None);
    }
}
