//! Persistence layer for thermod
//!
//! Provides the temperature history log: one line per classified reading,
//! appended to a plain text file.

mod file;
mod memory;
mod traits;

pub use file::*;
pub use memory::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
