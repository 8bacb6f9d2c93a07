//! The periodic guard loop
//!
//! Ticks the engine on a fixed interval and services control requests,
//! including while an evaluation is still waiting on the host.

use curfew_api::{ControlCommand, TickReport};
use curfew_host_api::{HostResult, StatusReporter};
use curfew_util::{Clock, CurfewError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{GuardEngine, ServiceLifecycleAdapter};

/// Why the guard loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop or Shutdown received from the host
    Requested(ControlCommand),
    /// Every control sender went away
    ControlClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested(cmd) => write!(f, "{} requested", cmd),
            StopReason::ControlClosed => write!(f, "control channel closed"),
        }
    }
}

type TickObserver = Box<dyn FnMut(&TickReport) + Send>;

pub struct GuardLoop {
    engine: GuardEngine,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    observer: Option<TickObserver>,
}

impl GuardLoop {
    pub fn new(
        engine: GuardEngine,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Result<Self, CurfewError> {
        if tick_interval.is_zero() {
            return Err(CurfewError::config("tick interval must be greater than zero"));
        }

        Ok(Self {
            engine,
            clock,
            tick_interval,
            observer: None,
        })
    }

    /// Called with the report of every completed evaluation
    pub fn with_observer(mut self, observer: impl FnMut(&TickReport) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run until a terminal control request arrives.
    ///
    /// The first evaluation happens immediately. A terminal request arriving
    /// mid-evaluation abandons it. Errors are status-report failures only.
    pub async fn run<R: StatusReporter>(
        &mut self,
        controls: &mut mpsc::Receiver<ControlCommand>,
        lifecycle: &mut ServiceLifecycleAdapter<R>,
    ) -> HostResult<StopReason> {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.tick_interval.as_secs_f64(), "Guard loop started");

        loop {
            tokio::select! {
                biased;

                cmd = controls.recv() => {
                    if let Some(reason) = handle_control(cmd, lifecycle)? {
                        return Ok(reason);
                    }
                }

                _ = ticker.tick() => {
                    if let Some(reason) = self.evaluate(controls, lifecycle).await? {
                        return Ok(reason);
                    }
                }
            }
        }
    }

    async fn evaluate<R: StatusReporter>(
        &mut self,
        controls: &mut mpsc::Receiver<ControlCommand>,
        lifecycle: &mut ServiceLifecycleAdapter<R>,
    ) -> HostResult<Option<StopReason>> {
        let now = self.clock.now();
        let tick = self.engine.tick(now);
        tokio::pin!(tick);

        loop {
            tokio::select! {
                biased;

                cmd = controls.recv() => {
                    if let Some(reason) = handle_control(cmd, lifecycle)? {
                        debug!("Evaluation abandoned");
                        return Ok(Some(reason));
                    }
                }

                report = &mut tick => {
                    if let Some(observer) = self.observer.as_mut() {
                        observer(&report);
                    }
                    return Ok(None);
                }
            }
        }
    }
}

/// Returns the stop reason if the loop must end
fn handle_control<R: StatusReporter>(
    cmd: Option<ControlCommand>,
    lifecycle: &mut ServiceLifecycleAdapter<R>,
) -> HostResult<Option<StopReason>> {
    let reason = match cmd {
        None => {
            warn!("Control channel closed, stopping");
            StopReason::ControlClosed
        }
        Some(ControlCommand::Interrogate) => {
            lifecycle.interrogate()?;
            return Ok(None);
        }
        Some(cmd) if !lifecycle.accepts(cmd) => {
            warn!(command = %cmd, "Control not accepted in current state, ignoring");
            return Ok(None);
        }
        Some(cmd) => {
            info!(command = %cmd, "Stop requested");
            StopReason::Requested(cmd)
        }
    };

    lifecycle.stop_pending()?;
    Ok(Some(reason))
}
