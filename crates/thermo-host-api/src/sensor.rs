//! Asynchronous temperature requests

use thermo_util::ObjectId;
use tokio::sync::mpsc;

/// Completion delivered to the daemon loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorEvent {
    /// A request finished; `reading` is `None` when the sensor failed
    Temperature {
        object: ObjectId,
        request_seq: u64,
        reading: Option<i32>,
    },
}

pub type SensorEventSender = mpsc::UnboundedSender<SensorEvent>;
pub type SensorEventReceiver = mpsc::UnboundedReceiver<SensorEvent>;

/// One-shot completion handle for a single accepted request.
///
/// Consuming it posts exactly one `SensorEvent` onto the daemon queue, so
/// every response is processed on the loop that owns the thermal state.
#[derive(Debug)]
pub struct TemperatureCompletion {
    object: ObjectId,
    request_seq: u64,
    tx: SensorEventSender,
}

impl TemperatureCompletion {
    pub fn new(object: ObjectId, request_seq: u64, tx: SensorEventSender) -> Self {
        Self {
            object,
            request_seq,
            tx,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn request_seq(&self) -> u64 {
        self.request_seq
    }

    /// Deliver a raw reading, or `None` if the read failed
    pub fn complete(self, reading: Option<i32>) {
        // A closed queue means the daemon is shutting down
        let _ = self.tx.send(SensorEvent::Temperature {
            object: self.object,
            request_seq: self.request_seq,
            reading,
        });
    }

    pub fn succeed(self, raw: i32) {
        self.complete(Some(raw));
    }

    pub fn fail(self) {
        self.complete(None);
    }
}

/// A source of temperature readings for one thermal object.
///
/// `request_temperature` starts a read and returns immediately. If it
/// returns `true` the completion will be consumed exactly once, possibly
/// much later. If it returns `false` the request could not be started and
/// the completion is dropped unused.
pub trait TemperatureSensor: Send + Sync {
    fn request_temperature(&self, completion: TemperatureCompletion) -> bool;

    /// Human readable source, for logs
    fn describe(&self) -> String {
        "sensor".into()
    }
}
