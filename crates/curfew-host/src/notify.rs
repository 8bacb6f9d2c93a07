//! Service status reporters
//!
//! Under systemd the status is forwarded over the `$NOTIFY_SOCKET`
//! datagram protocol (`Type=notify` units). Everywhere else the status
//! transitions are only logged.

use curfew_api::{ServiceState, ServiceStatus};
use curfew_host_api::{HostResult, StatusReporter};
use tracing::info;

/// Environment variable systemd uses to pass the notification socket
pub const NOTIFY_SOCKET_ENV: &str = "NOTIFY_SOCKET";

/// Render a status as a systemd notification message
pub fn notify_message(status: &ServiceStatus) -> String {
    match status.state {
        ServiceState::StartPending => "STATUS=Starting".to_string(),
        ServiceState::Running => "READY=1\nSTATUS=Guarding restricted window".to_string(),
        ServiceState::StopPending => "STOPPING=1\nSTATUS=Stopping".to_string(),
        ServiceState::Stopped => format!("STATUS=Stopped\nEXIT_STATUS={}", status.exit_code),
    }
}

/// Reports status to systemd's notification socket
#[cfg(unix)]
pub struct SystemdNotifier {
    socket: std::os::unix::net::UnixDatagram,
    target: String,
}

#[cfg(unix)]
impl SystemdNotifier {
    /// Connect to `$NOTIFY_SOCKET`, or `None` when not running under systemd
    pub fn from_env() -> HostResult<Option<Self>> {
        match std::env::var(NOTIFY_SOCKET_ENV) {
            Ok(target) if !target.is_empty() => Self::new(target).map(Some),
            _ => Ok(None),
        }
    }

    /// Target is a filesystem path, or `@name` for an abstract socket
    pub fn new(target: impl Into<String>) -> HostResult<Self> {
        let socket = std::os::unix::net::UnixDatagram::unbound()?;
        Ok(Self {
            socket,
            target: target.into(),
        })
    }

    fn send(&self, message: &str) -> HostResult<()> {
        let sent = match self.target.strip_prefix('@') {
            #[cfg(target_os = "linux")]
            Some(name) => {
                use std::os::linux::net::SocketAddrExt;
                let addr = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())?;
                self.socket.send_to_addr(message.as_bytes(), &addr)?
            }
            #[cfg(not(target_os = "linux"))]
            Some(_) => {
                return Err(curfew_host_api::HostError::ReportFailed(
                    "abstract notify sockets are only supported on Linux".into(),
                ));
            }
            None => self.socket.send_to(message.as_bytes(), &self.target)?,
        };

        if sent != message.len() {
            return Err(curfew_host_api::HostError::ReportFailed(format!(
                "short write to notify socket ({sent} of {} bytes)",
                message.len()
            )));
        }
        Ok(())
    }
}

#[cfg(unix)]
impl StatusReporter for SystemdNotifier {
    fn report_status(&mut self, status: &ServiceStatus) -> HostResult<()> {
        self.send(&notify_message(status))?;
        info!(state = %status.state, target = %self.target, "Status sent to service manager");
        Ok(())
    }
}

/// Reports status only to the log (foreground and unsupervised runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report_status(&mut self, status: &ServiceStatus) -> HostResult<()> {
        info!(
            state = %status.state,
            accepts = ?status.accepts,
            exit_code = status.exit_code,
            "Service status"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curfew_api::AcceptedControls;

    #[test]
    fn notify_messages() {
        let running = ServiceStatus::new(ServiceState::Running)
            .with_accepts(AcceptedControls::STOP | AcceptedControls::SHUTDOWN);
        assert!(notify_message(&running).starts_with("READY=1\n"));

        let stopping = ServiceStatus::new(ServiceState::StopPending);
        assert!(notify_message(&stopping).starts_with("STOPPING=1\n"));

        let stopped = ServiceStatus::new(ServiceState::Stopped).with_exit_code(1);
        assert!(notify_message(&stopped).ends_with("EXIT_STATUS=1"));
    }

    #[test]
    fn log_reporter_never_fails() {
        let mut reporter = LogReporter;
        for state in [
            ServiceState::StartPending,
            ServiceState::Running,
            ServiceState::StopPending,
            ServiceState::Stopped,
        ] {
            assert!(reporter.report_status(&ServiceStatus::new(state)).is_ok());
        }
    }

    #[cfg(unix)]
    #[test]
    fn systemd_notifier_sends_datagrams() {
        use std::os::unix::net::UnixDatagram;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notify.sock");
        let listener = UnixDatagram::bind(&path).unwrap();

        let mut notifier = SystemdNotifier::new(path.to_string_lossy().into_owned()).unwrap();
        notifier
            .report_status(&ServiceStatus::new(ServiceState::Running))
            .unwrap();

        let mut buf = [0u8; 256];
        let n = listener.recv(&mut buf).unwrap();
        let received = std::str::from_utf8(&buf[..n]).unwrap();
        assert!(received.contains("READY=1"));
    }

    #[cfg(unix)]
    #[test]
    fn systemd_notifier_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sock");

        let mut notifier = SystemdNotifier::new(path.to_string_lossy().into_owned()).unwrap();
        assert!(notifier
            .report_status(&ServiceStatus::new(ServiceState::StopPending))
            .is_err());
    }
}
