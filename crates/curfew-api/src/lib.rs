//! Shared data model for curfewd
//!
//! This crate defines the types exchanged between the guard core and
//! its collaborators:
//! - Sessions and guard state
//! - Service control commands and status
//! - Per-tick reports

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;
