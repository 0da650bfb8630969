//! Events emitted by the thermal manager

use thermo_api::ThermalStatus;
use thermo_host_api::WaitRequest;
use thermo_util::ObjectId;

/// Events emitted by the thermal manager for the daemon to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Aggregate thermal status changed; becomes `state_change_ind`
    StateChanged { status: ThermalStatus },

    /// Overheat broadcast toggled
    OverheatChanged { overheated: bool },

    /// Arm the next wake for an object
    WaitRequested(WaitRequest),

    /// Drop any armed wake for a removed object
    WaitCancelled { target: ObjectId },
}
