//! Guard engine: one evaluation per tick

use chrono::{DateTime, Local, Timelike};
use curfew_api::{DispatchOutcome, GuardState, InspectionFailurePolicy, TickReport};
use curfew_host_api::{SessionInspector, ShutdownDispatcher};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::GuardPolicy;

/// Evaluates the policy against the host and debounces shutdown dispatch.
///
/// At most one dispatch is issued per continuous stretch of qualifying
/// ticks. The state flips to `Triggered` before the dispatch is awaited, so
/// a failed dispatch is not retried until the condition clears.
pub struct GuardEngine {
    policy: GuardPolicy,
    inspector: Arc<dyn SessionInspector>,
    dispatcher: Arc<dyn ShutdownDispatcher>,
    inspection_failure: InspectionFailurePolicy,
    state: GuardState,
}

impl GuardEngine {
    pub fn new(
        policy: GuardPolicy,
        inspector: Arc<dyn SessionInspector>,
        dispatcher: Arc<dyn ShutdownDispatcher>,
        inspection_failure: InspectionFailurePolicy,
    ) -> Self {
        info!(
            window = %policy.window(),
            exempt = %policy.exempt_account(),
            inspection_failure = ?inspection_failure,
            "Guard engine initialized"
        );

        Self {
            policy,
            inspector,
            dispatcher,
            inspection_failure,
            state: GuardState::Idle,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Run one evaluation at `now`
    pub async fn tick(&mut self, now: DateTime<Local>) -> TickReport {
        let hour = now.hour() as u8;
        let in_window = self.policy.in_window(hour);

        let mut active_users = Vec::new();
        let mut exempt = false;
        let mut inspection_failed = false;

        // Outside the window the answer is already known
        if in_window {
            match self.inspector.list_active_sessions().await {
                Ok(sessions) => {
                    exempt = self.policy.has_exempt_session(&sessions);
                    active_users = sessions.into_iter().map(|s| s.user).collect();
                }
                Err(e) => {
                    inspection_failed = true;
                    exempt = self.inspection_failure == InspectionFailurePolicy::AssumeExempt;
                    warn!(
                        error = %e,
                        policy = ?self.inspection_failure,
                        "Session query failed"
                    );
                }
            }
        }

        let go = in_window && !exempt;
        let (next, fire) = self.state.advance(go);
        if next != self.state {
            info!(from = %self.state, to = %next, hour, "Guard state changed");
        }
        self.state = next;

        debug!(
            hour,
            in_window,
            exempt,
            users = active_users.len(),
            go,
            "Tick evaluated"
        );

        let dispatch = if fire {
            Some(self.dispatch().await)
        } else {
            None
        };

        TickReport {
            timestamp: now,
            hour,
            in_window,
            active_users,
            exempt,
            inspection_failed,
            go,
            state: self.state,
            dispatch,
        }
    }

    async fn dispatch(&self) -> DispatchOutcome {
        let request = self.policy.shutdown_request();
        warn!(
            delay_secs = request.delay_seconds(),
            "Restricted window active without exempt session, requesting shutdown"
        );

        match self.dispatcher.dispatch(&request).await {
            Ok(receipt) => {
                info!(
                    mechanism = %receipt.mechanism,
                    attempts = receipt.attempts,
                    "Shutdown requested"
                );
                DispatchOutcome::Issued {
                    mechanism: receipt.mechanism,
                    attempts: receipt.attempts,
                }
            }
            Err(e) => {
                error!(error = %e, "Shutdown dispatch failed");
                DispatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
