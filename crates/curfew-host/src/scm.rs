//! Windows Service Control Manager binding
//!
//! The SCM delivers controls to a handler registered under the service
//! name and expects every status change through `SetServiceStatus`.
//! Interrogate, Stop and Shutdown are forwarded to the guard as
//! `ControlCommand`s; everything else is refused.

use curfew_api::{AcceptedControls, ControlCommand, ServiceState, ServiceStatus};
use curfew_host_api::{HostError, HostResult, StatusReporter};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState as ScmState,
    ServiceStatus as ScmStatus, ServiceType,
};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};

use crate::control::CONTROL_QUEUE;

/// Time the SCM should allow between pending status updates
pub const PENDING_WAIT_HINT: Duration = Duration::from_secs(10);

/// Map an SCM control to a guard command, if the guard handles it
pub fn translate_control(control: ServiceControl) -> Option<ControlCommand> {
    match control {
        ServiceControl::Interrogate => Some(ControlCommand::Interrogate),
        ServiceControl::Stop => Some(ControlCommand::Stop),
        ServiceControl::Shutdown => Some(ControlCommand::Shutdown),
        _ => None,
    }
}

/// Build the SCM status record for `status`.
///
/// `checkpoint` only matters for pending states; it must grow with each
/// report of the same pending state.
pub fn to_scm_status(status: &ServiceStatus, checkpoint: u32) -> ScmStatus {
    let pending = matches!(
        status.state,
        ServiceState::StartPending | ServiceState::StopPending
    );

    let mut controls_accepted = ServiceControlAccept::empty();
    if status.accepts.contains(AcceptedControls::STOP) {
        controls_accepted |= ServiceControlAccept::STOP;
    }
    if status.accepts.contains(AcceptedControls::SHUTDOWN) {
        controls_accepted |= ServiceControlAccept::SHUTDOWN;
    }

    let exit_code = match status.exit_code {
        0 => ServiceExitCode::Win32(0),
        code => ServiceExitCode::ServiceSpecific(code),
    };

    ScmStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state: match status.state {
            ServiceState::StartPending => ScmState::StartPending,
            ServiceState::Running => ScmState::Running,
            ServiceState::StopPending => ScmState::StopPending,
            ServiceState::Stopped => ScmState::Stopped,
        },
        controls_accepted,
        exit_code,
        checkpoint: if pending { checkpoint } else { 0 },
        wait_hint: if pending { PENDING_WAIT_HINT } else { Duration::ZERO },
        process_id: None,
    }
}

/// Reports status to the SCM through the registered handle
pub struct ScmReporter {
    handle: ServiceStatusHandle,
    checkpoint: u32,
}

impl ScmReporter {
    /// Register the control handler for `service_name`.
    ///
    /// Must be called from the service main function. The returned receiver
    /// yields the controls the guard handles.
    pub fn register(service_name: &str) -> HostResult<(Self, mpsc::Receiver<ControlCommand>)> {
        let (tx, rx) = mpsc::channel(CONTROL_QUEUE);

        let handler = move |control: ServiceControl| -> ServiceControlHandlerResult {
            let Some(cmd) = translate_control(control) else {
                debug!(control = ?control, "Ignoring service control");
                return ServiceControlHandlerResult::NotImplemented;
            };

            info!(command = %cmd, "Received service control");
            if let Err(e) = tx.try_send(cmd) {
                warn!(command = %cmd, error = %e, "Control queue unavailable, dropping");
            }
            ServiceControlHandlerResult::NoError
        };

        let handle = service_control_handler::register(service_name, handler).map_err(|e| {
            HostError::ReportFailed(format!("failed to register control handler: {e}"))
        })?;

        Ok((
            Self {
                handle,
                checkpoint: 0,
            },
            rx,
        ))
    }
}

impl StatusReporter for ScmReporter {
    fn report_status(&mut self, status: &ServiceStatus) -> HostResult<()> {
        self.checkpoint = match status.state {
            ServiceState::StartPending | ServiceState::StopPending => self.checkpoint + 1,
            _ => 0,
        };

        self.handle
            .set_service_status(to_scm_status(status, self.checkpoint))
            .map_err(|e| HostError::ReportFailed(format!("SetServiceStatus failed: {e}")))?;

        info!(state = %status.state, "Status sent to service control manager");
        Ok(())
    }
}
