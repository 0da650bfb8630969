//! Mock host implementations for testing

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thermo_util::ObjectId;

use crate::{TemperatureCompletion, TemperatureSensor, WaitRequest, WakeScheduler};

/// Sensor whose requests stay open until the test completes them
#[derive(Default)]
pub struct MockSensor {
    pending: Mutex<VecDeque<TemperatureCompletion>>,
    requests: AtomicU64,

    /// Configure request issuance to fail
    pub refuse: AtomicBool,
}

impl MockSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sensor that refuses every request
    pub fn refusing() -> Self {
        let sensor = Self::new();
        sensor.set_refuse(true);
        sensor
    }

    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of accepted requests so far
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of accepted requests not yet completed
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Complete the oldest open request. Returns false if none was open.
    pub fn complete_next(&self, reading: Option<i32>) -> bool {
        let completion = self.pending.lock().unwrap().pop_front();
        match completion {
            Some(completion) => {
                completion.complete(reading);
                true
            }
            None => false,
        }
    }

    /// Drop the oldest open request without completing it
    pub fn lose_next(&self) -> bool {
        self.pending.lock().unwrap().pop_front().is_some()
    }
}

impl TemperatureSensor for MockSensor {
    fn request_temperature(&self, completion: TemperatureCompletion) -> bool {
        if self.refuse.load(Ordering::SeqCst) {
            return false;
        }

        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().unwrap().push_back(completion);
        true
    }

    fn describe(&self) -> String {
        "mock".into()
    }
}

/// Scheduler that only records what it was asked
#[derive(Default)]
pub struct MockWakeScheduler {
    requests: Mutex<Vec<WaitRequest>>,
    cancelled: Mutex<Vec<ObjectId>>,
}

impl MockWakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<WaitRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_for(&self, target: ObjectId) -> Option<WaitRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.target == target)
            .copied()
    }

    pub fn cancelled(&self) -> Vec<ObjectId> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl WakeScheduler for MockWakeScheduler {
    fn wait(&self, request: WaitRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn cancel(&self, target: ObjectId) {
        self.cancelled.lock().unwrap().push(target);
    }
}
