//! Shared utilities for thermod
//!
//! This crate provides:
//! - ID types (ObjectId, ClientId)
//! - Time utilities (monotonic instants, wall clock)
//! - Default paths for socket, configuration and tuning files

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
