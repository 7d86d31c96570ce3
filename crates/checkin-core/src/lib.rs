//! Core domain types for the chapel check-in terminal.
//!
//! Everything the terminal, the device layer and the storage adapters agree
//! on lives here: staff identity, attendance events, decoded scans, the
//! shared error type and the timing/tone constants.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
