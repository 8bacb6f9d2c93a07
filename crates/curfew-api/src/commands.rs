//! Service control protocol: commands from the host and status reported back

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle request delivered by the host's service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    /// Report current status without changing it
    Interrogate,
    Stop,
    /// The host itself is shutting down
    Shutdown,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Interrogate => write!(f, "interrogate"),
            ControlCommand::Stop => write!(f, "stop"),
            ControlCommand::Shutdown => write!(f, "shutdown"),
        }
    }
}

bitflags! {
    /// Controllable commands the service registers interest in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AcceptedControls: u8 {
        const STOP = 1 << 0;
        const SHUTDOWN = 1 << 1;
    }
}

impl AcceptedControls {
    /// Whether `cmd` may be sent while these controls are accepted.
    /// Interrogate is always allowed.
    pub fn allows(&self, cmd: ControlCommand) -> bool {
        match cmd {
            ControlCommand::Interrogate => true,
            ControlCommand::Stop => self.contains(AcceptedControls::STOP),
            ControlCommand::Shutdown => self.contains(AcceptedControls::SHUTDOWN),
        }
    }
}

/// Lifecycle state mirrored to the host's service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    StartPending,
    Running,
    StopPending,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::StartPending => write!(f, "start_pending"),
            ServiceState::Running => write!(f, "running"),
            ServiceState::StopPending => write!(f, "stop_pending"),
            ServiceState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Full status record reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub accepts: AcceptedControls,
    /// Process exit code, only meaningful once `Stopped`
    pub exit_code: u32,
}

impl ServiceStatus {
    pub fn new(state: ServiceState) -> Self {
        Self {
            state,
            accepts: AcceptedControls::empty(),
            exit_code: 0,
        }
    }

    pub fn with_accepts(mut self, accepts: AcceptedControls) -> Self {
        self.accepts = accepts;
        self
    }

    pub fn with_exit_code(mut self, exit_code: u32) -> Self {
        self.exit_code = exit_code;
        self
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::new(ServiceState::StartPending)
    }
}
