//! Linux host adapter for thermod
//!
//! Provides:
//! - Temperature sensors backed by sysfs files
//! - A heartbeat-aligned wake scheduler on tokio timers
//! - The temp reaper, which runs a cleanup helper when `/` fills up
//! - A disk space monitor feeding the reaper

mod disk;
mod heartbeat;
mod reaper;
mod sysfs;

pub use disk::*;
pub use heartbeat::*;
pub use reaper::*;
pub use sysfs::*;
