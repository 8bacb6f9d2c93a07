//! Host capability traits for curfewd
//!
//! This crate defines the interface between the guard core and
//! platform-specific implementations. It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
