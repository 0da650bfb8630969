//! Thermal state machine for thermod
//!
//! This crate is the heart of thermod, containing:
//! - Hysteresis classification of readings into thermal status levels
//! - The registry of thermal objects and their request state
//!   (Idle -> RequestPending -> Classified/Failed -> Waiting -> Idle)
//! - Aggregation of the worst status and the notifications it drives

mod classify;
mod events;
mod manager;
mod object;

pub use classify::*;
pub use events::*;
pub use manager::*;
pub use object::*;
