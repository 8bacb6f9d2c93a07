//! Guard core for curfewd
//!
//! This crate is the heart of curfewd, containing:
//! - The fixed restricted-window policy and its decision rule
//! - The debounce state machine (Idle -> Triggered -> Idle)
//! - The periodic guard loop and its control-request handling
//! - The service lifecycle (StartPending -> Running -> StopPending -> Stopped)

mod engine;
mod guard_loop;
mod lifecycle;
mod policy;

pub use engine::*;
pub use guard_loop::*;
pub use lifecycle::*;
pub use policy::*;
