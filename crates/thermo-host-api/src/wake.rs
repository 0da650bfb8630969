//! Wake scheduling

use std::time::Duration;
use thermo_util::ObjectId;

/// Ask to be woken for `target` after an interval within `[mintime, maxtime]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRequest {
    pub target: ObjectId,
    pub mintime: Duration,
    pub maxtime: Duration,
}

impl WaitRequest {
    pub fn new(target: ObjectId, mintime: Duration, maxtime: Duration) -> Self {
        Self {
            target,
            mintime,
            maxtime,
        }
    }
}

/// Interval timer service.
///
/// Expiry is reported back as `HostEvent::Wakeup { target }`.
pub trait WakeScheduler: Send + Sync {
    /// Arm a wait
    fn wait(&self, request: WaitRequest);

    /// Drop any armed wait for `target`
    fn cancel(&self, _target: ObjectId) {}
}
