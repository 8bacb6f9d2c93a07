//! Mock host implementations for testing

use async_trait::async_trait;
use curfew_api::{ServiceState, ServiceStatus, Session};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    DispatchReceipt, HostError, HostResult, SessionInspector, ShutdownDispatcher,
    ShutdownRequest, StatusReporter,
};

/// Session inspector returning a scripted session list
#[derive(Clone, Default)]
pub struct MockSessionInspector {
    sessions: Arc<Mutex<Vec<Session>>>,
    queries: Arc<AtomicUsize>,

    /// Configure the query to fail
    pub fail_query: Arc<Mutex<bool>>,

    /// Simulated query latency
    pub delay: Arc<Mutex<Option<Duration>>>,
}

impl MockSessionInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        let mock = Self::new();
        mock.set_sessions(sessions);
        mock
    }

    pub fn set_sessions(&self, sessions: Vec<Session>) {
        *self.sessions.lock().unwrap() = sessions;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail_query.lock().unwrap() = fail;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Number of times the host was queried
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionInspector for MockSessionInspector {
    async fn list_active_sessions(&self) -> HostResult<Vec<Session>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_query.lock().unwrap() {
            return Err(HostError::CommandFailed {
                program: "mock-query".into(),
                message: "Mock query failure".into(),
            });
        }

        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect())
    }
}

/// Shutdown dispatcher that records every request
#[derive(Clone, Default)]
pub struct MockShutdownDispatcher {
    requests: Arc<Mutex<Vec<ShutdownRequest>>>,

    /// Configure dispatch to fail
    pub fail_dispatch: Arc<Mutex<bool>>,
}

impl MockShutdownDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail_dispatch.lock().unwrap() = fail;
    }

    /// Requests received so far, including failed ones
    pub fn requests(&self) -> Vec<ShutdownRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ShutdownDispatcher for MockShutdownDispatcher {
    async fn dispatch(&self, request: &ShutdownRequest) -> HostResult<DispatchReceipt> {
        self.requests.lock().unwrap().push(request.clone());

        if *self.fail_dispatch.lock().unwrap() {
            return Err(HostError::DispatchFailed("Mock dispatch failure".into()));
        }

        Ok(DispatchReceipt {
            mechanism: "mock-shutdown".into(),
            attempts: 1,
        })
    }
}

/// Status reporter keeping the full history of reported statuses
#[derive(Clone, Default)]
pub struct RecordingReporter {
    history: Arc<Mutex<Vec<ServiceStatus>>>,

    /// Fail when asked to report this state
    pub fail_on: Arc<Mutex<Option<ServiceState>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, state: Option<ServiceState>) {
        *self.fail_on.lock().unwrap() = state;
    }

    pub fn history(&self) -> Vec<ServiceStatus> {
        self.history.lock().unwrap().clone()
    }

    /// Reported states in order
    pub fn states(&self) -> Vec<ServiceState> {
        self.history.lock().unwrap().iter().map(|s| s.state).collect()
    }
}

impl StatusReporter for RecordingReporter {
    fn report_status(&mut self, status: &ServiceStatus) -> HostResult<()> {
        if *self.fail_on.lock().unwrap() == Some(status.state) {
            return Err(HostError::ReportFailed(format!(
                "Mock report failure for {}",
                status.state
            )));
        }

        self.history.lock().unwrap().push(*status);
        Ok(())
    }
}
