//! Host interfaces for thermod
//!
//! This crate defines the seams between the thermal core and the platform:
//! - Asynchronous temperature requests (one implementation per sensor type)
//! - Wake scheduling for per-object polling intervals
//! - Events the host feeds back into the daemon loop
//!
//! It contains no platform code itself.

mod exit;
mod mock;
mod sensor;
mod traits;
mod wake;

pub use exit::*;
pub use mock::*;
pub use sensor::*;
pub use traits::*;
pub use wake::*;
