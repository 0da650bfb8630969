//! Disk space monitor

use nix::sys::statvfs::statvfs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thermo_config::ReaperConfig;
use thermo_host_api::{HostError, HostEvent, HostResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Periodically checks free space on a set of mounts and reports the ones
/// below the limit as `HostEvent::DiskSpaceLow`
pub struct DiskMonitor {
    mounts: Vec<PathBuf>,
    min_free_percent: u8,
    interval: Duration,
    event_tx: mpsc::UnboundedSender<HostEvent>,
}

impl DiskMonitor {
    pub fn new(config: &ReaperConfig, event_tx: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            mounts: config.watch_mounts.clone(),
            min_free_percent: config.min_free_percent,
            interval: config.check_interval,
            event_tx,
        }
    }

    /// Check every mount once, sending an event for each low one
    pub fn check(&self) -> usize {
        let mut low = 0;

        for mount in &self.mounts {
            match free_percent(mount) {
                Ok(free) if is_low(free, self.min_free_percent) => {
                    info!(mount = %mount.display(), free_percent = free, "Disk space running out");
                    low += 1;
                    let _ = self.event_tx.send(HostEvent::DiskSpaceLow {
                        mount_path: mount.clone(),
                    });
                }
                Ok(free) => {
                    debug!(mount = %mount.display(), free_percent = free, "Disk space ok");
                }
                Err(e) => {
                    warn!(mount = %mount.display(), error = %e, "Failed to check disk space");
                }
            }
        }

        low
    }

    /// Run checks on an interval until the event receiver goes away
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if self.event_tx.is_closed() {
                    break;
                }
                self.check();
            }
        })
    }
}

/// Percentage of blocks available to unprivileged users on `mount`
pub fn free_percent(mount: &Path) -> HostResult<f64> {
    let stat = statvfs(mount).map_err(|e| HostError::Io(e.into()))?;

    let blocks = stat.blocks() as f64;
    if blocks == 0.0 {
        return Err(HostError::Internal(format!(
            "{} reports no blocks",
            mount.display()
        )));
    }

    Ok(stat.blocks_available() as f64 * 100.0 / blocks)
}

/// Free space below the limit
pub fn is_low(free_percent: f64, min_free_percent: u8) -> bool {
    free_percent < f64::from(min_free_percent)
}
