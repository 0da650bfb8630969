//! Heartbeat-aligned wake timers

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thermo_host_api::{HostEvent, WaitRequest, WakeScheduler};
use thermo_util::ObjectId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Wake scheduler whose timers expire on shared heartbeat slots.
///
/// Slots are multiples of `period` since the scheduler was created. A wait
/// fires on the first slot inside `[mintime, maxtime]`, or at `maxtime` when
/// no slot falls inside, so objects with overlapping windows wake together.
/// At most one wait is armed per target; a new one replaces the old.
pub struct HeartbeatScheduler {
    period: Duration,
    epoch: Instant,
    timers: Mutex<HashMap<ObjectId, JoinHandle<()>>>,
    event_tx: mpsc::UnboundedSender<HostEvent>,
}

impl HeartbeatScheduler {
    pub fn new(period: Duration, event_tx: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            period,
            epoch: Instant::now(),
            timers: Mutex::new(HashMap::new()),
            event_tx,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of armed waits, including ones that already fired
    pub fn armed(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Abort every armed wait
    pub fn cancel_all(&self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }
    }
}

impl WakeScheduler for HeartbeatScheduler {
    fn wait(&self, request: WaitRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(target_id = %request.target, "No runtime to arm wait on");
            return;
        };

        let delay = slot_delay(
            self.epoch.elapsed(),
            self.period,
            request.mintime,
            request.maxtime,
        );

        debug!(
            target_id = %request.target,
            mintime = request.mintime.as_secs(),
            maxtime = request.maxtime.as_secs(),
            delay_ms = delay.as_millis() as u64,
            "Wait armed"
        );

        let target = request.target;
        let event_tx = self.event_tx.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(HostEvent::Wakeup { target });
        });

        let Ok(mut timers) = self.timers.lock() else {
            return;
        };
        if let Some(previous) = timers.insert(target, handle) {
            previous.abort();
        }
    }

    fn cancel(&self, target: ObjectId) {
        if let Ok(mut timers) = self.timers.lock() {
            if let Some(handle) = timers.remove(&target) {
                handle.abort();
                debug!(target_id = %target, "Wait cancelled");
            }
        }
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Delay from `elapsed` (time since the heartbeat epoch) to the first slot
/// boundary within `[elapsed + mintime, elapsed + maxtime]`.
///
/// Falls back to `maxtime` when no boundary fits, and to `mintime` when
/// `maxtime` is below it or the period is zero.
pub fn slot_delay(elapsed: Duration, period: Duration, mintime: Duration, maxtime: Duration) -> Duration {
    let period_ms = period.as_millis();
    if period_ms == 0 || maxtime < mintime {
        return mintime;
    }

    let now_ms = elapsed.as_millis();
    let earliest = now_ms + mintime.as_millis();
    let latest = now_ms + maxtime.as_millis();
    let boundary = earliest.div_ceil(period_ms) * period_ms;

    if boundary <= latest {
        Duration::from_millis((boundary - now_ms) as u64)
    } else {
        maxtime
    }
}
