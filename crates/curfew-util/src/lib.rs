//! Shared utilities for curfewd
//!
//! This crate provides:
//! - Time utilities (mockable wall clock, hour-of-day windows)
//! - Error types
//! - Default paths for the configuration file

mod error;
mod paths;
mod time;

pub use error::*;
pub use paths::*;
pub use time::*;
