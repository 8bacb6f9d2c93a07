//! Service lifecycle: status reporting around the guard loop

use curfew_api::{AcceptedControls, ControlCommand, ServiceState, ServiceStatus};
use curfew_host_api::{HostError, HostResult, StatusReporter};
use curfew_util::CurfewError;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{GuardLoop, StopReason};

/// Controls accepted while the guard is running
pub const RUNNING_CONTROLS: AcceptedControls = AcceptedControls::STOP.union(AcceptedControls::SHUTDOWN);

/// Exit code reported when the service ends abnormally
pub const FAILURE_EXIT_CODE: u32 = 1;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to start guard loop: {0}")]
    Start(#[from] CurfewError),

    #[error("Failed to install control handlers: {0}")]
    Controls(#[source] HostError),

    #[error("Status reporting failed: {0}")]
    Report(#[from] HostError),
}

/// Tracks the service status and mirrors every change to the host
pub struct ServiceLifecycleAdapter<R: StatusReporter> {
    reporter: R,
    status: ServiceStatus,
}

impl<R: StatusReporter> ServiceLifecycleAdapter<R> {
    /// Starts in `StartPending`; nothing is reported until the first transition.
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            status: ServiceStatus::default(),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn start_pending(&mut self) -> HostResult<()> {
        self.transition(ServiceStatus::new(ServiceState::StartPending))
    }

    pub fn running(&mut self) -> HostResult<()> {
        self.transition(ServiceStatus::new(ServiceState::Running).with_accepts(RUNNING_CONTROLS))
    }

    pub fn stop_pending(&mut self) -> HostResult<()> {
        self.transition(ServiceStatus::new(ServiceState::StopPending))
    }

    pub fn stopped(&mut self, exit_code: u32) -> HostResult<()> {
        self.transition(ServiceStatus::new(ServiceState::Stopped).with_exit_code(exit_code))
    }

    /// Re-report the current status unchanged
    pub fn interrogate(&mut self) -> HostResult<()> {
        self.reporter.report_status(&self.status)
    }

    /// Whether the current status accepts `cmd`
    pub fn accepts(&self, cmd: ControlCommand) -> bool {
        self.status.accepts.allows(cmd)
    }

    fn transition(&mut self, status: ServiceStatus) -> HostResult<()> {
        info!(from = %self.status.state, to = %status.state, "Service status transition");
        self.status = status;
        self.reporter.report_status(&self.status)
    }

    /// Best-effort terminal report after a failure
    fn fail(&mut self) {
        if let Err(e) = self.stopped(FAILURE_EXIT_CODE) {
            error!(error = %e, "Failed to report stopped status");
        }
    }
}

/// Run the guard as a service.
///
/// Reports `StartPending`, then `start` builds the guard loop and opens the
/// control channel. Reports `Running` and runs the loop until a stop request,
/// then reports `Stopped`. A failing `start` or status report is fatal: a
/// final `Stopped` with a non-zero exit code is attempted.
pub async fn run_service<R, F>(reporter: R, start: F) -> Result<StopReason, ServiceError>
where
    R: StatusReporter,
    F: FnOnce() -> Result<(GuardLoop, mpsc::Receiver<ControlCommand>), ServiceError>,
{
    let mut lifecycle = ServiceLifecycleAdapter::new(reporter);

    if let Err(e) = lifecycle.start_pending() {
        error!(error = %e, "Failed to report start");
        lifecycle.fail();
        return Err(e.into());
    }

    let (mut guard, mut controls) = match start() {
        Ok(started) => started,
        Err(e) => {
            error!(error = %e, "Guard failed to start");
            lifecycle.fail();
            return Err(e);
        }
    };

    if let Err(e) = lifecycle.running() {
        error!(error = %e, "Failed to report running");
        lifecycle.fail();
        return Err(e.into());
    }

    info!("Guard running");

    match guard.run(&mut controls, &mut lifecycle).await {
        Ok(reason) => {
            lifecycle.stopped(0)?;
            info!(reason = %reason, "Guard stopped");
            Ok(reason)
        }
        Err(e) => {
            error!(error = %e, "Guard loop ended on status failure");
            lifecycle.fail();
            Err(e.into())
        }
    }
}
