//! Host capability traits

use async_trait::async_trait;
use curfew_api::{ServiceStatus, Session};
use std::time::Duration;
use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Command '{program}' failed: {message}")]
    CommandFailed { program: String, message: String },

    #[error("Command '{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("Shutdown dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Status report failed: {0}")]
    ReportFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// A request to power the host off after a visible countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownRequest {
    /// Countdown before the host powers off
    pub delay: Duration,
    /// Shown to the logged-in user during the countdown
    pub message: String,
}

impl ShutdownRequest {
    pub fn new(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            delay,
            message: message.into(),
        }
    }

    pub fn delay_seconds(&self) -> u64 {
        self.delay.as_secs()
    }

    /// Delay in whole minutes, rounded up (for `shutdown +m` style commands)
    pub fn delay_minutes(&self) -> u64 {
        self.delay.as_secs().div_ceil(60)
    }
}

/// Which mechanism carried out a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// Program of the last mechanism that succeeded
    pub mechanism: String,
    /// Number of mechanisms run
    pub attempts: usize,
}

/// Enumerates interactive login sessions on the host
#[async_trait]
pub trait SessionInspector: Send + Sync {
    /// List the sessions that are currently active.
    ///
    /// An empty list means nobody is logged in. An error means the query
    /// itself could not be carried out; the caller decides what that means.
    async fn list_active_sessions(&self) -> HostResult<Vec<Session>>;
}

/// Issues the host shutdown action
#[async_trait]
pub trait ShutdownDispatcher: Send + Sync {
    /// Best effort: the caller logs the outcome and never retries within a tick.
    async fn dispatch(&self, request: &ShutdownRequest) -> HostResult<DispatchReceipt>;
}

/// Reports service status to the host's service manager
pub trait StatusReporter: Send {
    fn report_status(&mut self, status: &ServiceStatus) -> HostResult<()>;
}

impl<R: StatusReporter + ?Sized> StatusReporter for Box<R> {
    fn report_status(&mut self, status: &ServiceStatus) -> HostResult<()> {
        (**self).report_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_minutes_rounds_up() {
        let request = ShutdownRequest::new(Duration::from_secs(60), "bye");
        assert_eq!(request.delay_seconds(), 60);
        assert_eq!(request.delay_minutes(), 1);

        let request = ShutdownRequest::new(Duration::from_secs(61), "bye");
        assert_eq!(request.delay_minutes(), 2);

        let request = ShutdownRequest::new(Duration::ZERO, "bye");
        assert_eq!(request.delay_minutes(), 0);
    }
}
