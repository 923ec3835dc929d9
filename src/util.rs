//! Utility types and functions used across path building and validation

pub mod error;

pub use error::*;

use std::time::{SystemTime, UNIX_EPOCH};

/// `unix_now` returns the current time expressed as seconds since the Unix epoch, or zero
/// if the system clock predates the epoch.
pub fn unix_now() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(_) => 0,
    }
}
