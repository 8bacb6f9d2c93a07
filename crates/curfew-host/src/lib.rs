//! Host adapter for curfewd
//!
//! Provides:
//! - Host command execution with timeouts
//! - Session table query and parsing
//! - Shutdown dispatch with ordered fallbacks
//! - Service status reporting (systemd notify, Windows SCM, log)
//! - Control requests from process signals or the Windows SCM

mod control;
mod notify;
mod process;
#[cfg(windows)]
mod scm;
mod session;
mod shutdown;

pub use control::*;
pub use notify::*;
pub use process::*;
#[cfg(windows)]
pub use scm::*;
pub use session::*;
pub use shutdown::*;
