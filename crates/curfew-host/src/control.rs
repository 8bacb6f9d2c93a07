//! Control requests from the host
//!
//! On Unix the service manager speaks to the daemon through signals:
//! - SIGTERM, SIGINT: stop
//! - SIGHUP: shutdown (the session or host is going away)
//! - SIGUSR1: interrogate (re-report current status)
//!
//! Elsewhere only Ctrl-C is observed and mapped to stop.

use curfew_api::ControlCommand;
use curfew_host_api::HostResult;
use tokio::sync::mpsc;
use tracing::info;

/// Capacity of the control channel
pub(crate) const CONTROL_QUEUE: usize = 16;

/// Install signal handlers and forward them as control commands.
///
/// Handlers are installed before this returns. The forwarding task ends
/// when the receiver is dropped.
#[cfg(unix)]
pub fn spawn_signal_controls() -> HostResult<mpsc::Receiver<ControlCommand>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    let (tx, rx) = mpsc::channel(CONTROL_QUEUE);

    tokio::spawn(async move {
        loop {
            let cmd = tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                    ControlCommand::Stop
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT");
                    ControlCommand::Stop
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP");
                    ControlCommand::Shutdown
                }
                _ = sigusr1.recv() => {
                    tracing::debug!("Received SIGUSR1");
                    ControlCommand::Interrogate
                }
            };

            if tx.send(cmd).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

#[cfg(not(unix))]
pub fn spawn_signal_controls() -> HostResult<mpsc::Receiver<ControlCommand>> {
    let (tx, rx) = mpsc::channel(CONTROL_QUEUE);

    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                break;
            }
            info!("Received Ctrl-C");
            if tx.send(ControlCommand::Stop).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sigusr1_becomes_interrogate() {
        let mut rx = spawn_signal_controls().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-USR1", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let cmd = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(cmd, Some(ControlCommand::Interrogate));
    }
}
