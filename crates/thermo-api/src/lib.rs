//! Protocol types for thermod IPC
//!
//! This crate defines the stable API between thermod and its clients:
//! - Thermal status levels and hysteresis bands
//! - Commands (requests from clients) and responses
//! - Events (daemon -> clients)

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
