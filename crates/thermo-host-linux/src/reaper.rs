//! Temp reaper: runs a cleanup helper when the root filesystem fills up

use nix::sys::signal::{self, Signal};
use nix::unistd::{Pid, User, geteuid, setgid, setgroups, setuid};
use std::path::Path;
use std::process::Stdio;
use thermo_config::ReaperConfig;
use thermo_host_api::{ExitStatus, HostError, HostEvent, HostResult};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Name the helper sees as `argv[0]`
const HELPER_ARGV0: &str = "rpdir";

/// Supervises at most one cleanup helper at a time.
///
/// The helper runs at a lowered priority as an unprivileged account. Its
/// exit arrives later as `HostEvent::ReaperExited` and must be passed back
/// through [`TempReaper::on_exit`].
pub struct TempReaper {
    config: ReaperConfig,
    reaper_pid: Option<u32>,
    event_tx: mpsc::UnboundedSender<HostEvent>,
}

impl TempReaper {
    pub fn new(config: ReaperConfig, event_tx: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            config,
            reaper_pid: None,
            event_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.reaper_pid.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.reaper_pid
    }

    /// Handle a low disk space report. Returns true if a helper was started.
    pub fn on_disk_space(&mut self, mount_path: &Path) -> bool {
        if let Some(pid) = self.reaper_pid {
            debug!(pid, "Reaper process already running");
            return false;
        }

        if !disk_space_running_out(mount_path) {
            return false;
        }

        match self.spawn() {
            Ok(pid) => {
                info!(pid, helper = %self.config.helper_path.display(), "Reaper process started");
                self.reaper_pid = Some(pid);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to start reaper process");
                false
            }
        }
    }

    /// Handle the helper's exit
    pub fn on_exit(&mut self, pid: u32, status: &ExitStatus) {
        if self.reaper_pid != Some(pid) {
            debug!(pid, "Exit of unknown process ignored");
            return;
        }

        self.reaper_pid = None;

        if status.is_success() {
            debug!(pid, "Reaper process finished");
        } else {
            warn!(pid, ?status, "Reaper process failed");
        }
    }

    /// Kill a running helper with SIGKILL
    pub fn kill(&mut self) {
        let Some(pid) = self.reaper_pid.take() else {
            return;
        };

        info!(pid, "Killing temp reaper");

        match signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => warn!(pid, error = %e, "Failed to kill reaper process"),
        }
    }

    fn spawn(&self) -> HostResult<u32> {
        let account = resolve_account(&self.config.users)?;
        let uid = account.uid;
        let gid = account.gid;
        let priority = self.config.priority;
        // Only a privileged parent can replace the group list
        let drop_groups = geteuid().is_root();

        debug!(user = %account.name, priority, "Starting reaper process");

        let mut cmd = Command::new(&self.config.helper_path);
        cmd.arg0(HELPER_ARGV0)
            .arg(&self.config.target_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: only async-signal-safe calls between fork and exec
        unsafe {
            cmd.pre_exec(move || {
                if libc::setpriority(libc::PRIO_PROCESS, 0, priority) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                if drop_groups {
                    setgroups(&[gid])?;
                }
                setgid(gid)?;
                setuid(uid)?;
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| {
            HostError::SpawnFailed(format!(
                "Failed to spawn {}: {}",
                self.config.helper_path.display(),
                e
            ))
        })?;

        let pid = child
            .id()
            .ok_or_else(|| HostError::Internal("Reaper exited before its pid was read".into()))?;

        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => ExitStatus::from(status),
                Err(e) => {
                    warn!(pid, error = %e, "Failed to wait for reaper process");
                    ExitStatus::with_code(-1)
                }
            };
            let _ = event_tx.send(HostEvent::ReaperExited { pid, status });
        });

        Ok(pid)
    }
}

/// Only the root filesystem holds the directories the helper cleans
pub fn disk_space_running_out(mount_path: &Path) -> bool {
    mount_path == Path::new("/")
}

/// First account in `users` that exists on this system
fn resolve_account(users: &[String]) -> HostResult<User> {
    for name in users {
        match User::from_name(name) {
            Ok(Some(user)) => return Ok(user),
            Ok(None) => debug!(user = %name, "No such account"),
            Err(e) => debug!(user = %name, error = %e, "Account lookup failed"),
        }
    }

    Err(HostError::PermissionDenied(format!(
        "none of the accounts {:?} exist",
        users
    )))
}
