//! The restricted-window policy
//!
//! The policy is fixed: between 21:00 and 11:00 the host may only stay up
//! while the exempt account has an active session.

use curfew_api::Session;
use curfew_host_api::ShutdownRequest;
use curfew_util::TimeWindow;
use std::time::Duration;

/// Hours during which the host must shut down unless exempt
pub const RESTRICTED_WINDOW: TimeWindow = match TimeWindow::new(21, 11) {
    Some(window) => window,
    None => panic!("restricted window hours out of range"),
};

/// Account whose active session suppresses shutdown (compared case-insensitively)
pub const EXEMPT_ACCOUNT: &str = "administrator";

/// Countdown given to logged-in users before power-off
pub const SHUTDOWN_DELAY: Duration = Duration::from_secs(60);

/// The guard's decision rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    window: TimeWindow,
    exempt_account: String,
    shutdown_delay: Duration,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            window: RESTRICTED_WINDOW,
            exempt_account: EXEMPT_ACCOUNT.to_string(),
            shutdown_delay: SHUTDOWN_DELAY,
        }
    }
}

impl GuardPolicy {
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn exempt_account(&self) -> &str {
        &self.exempt_account
    }

    pub fn in_window(&self, hour: u8) -> bool {
        self.window.contains_hour(hour)
    }

    /// True if any active session belongs to the exempt account
    pub fn has_exempt_session(&self, sessions: &[Session]) -> bool {
        sessions
            .iter()
            .any(|s| s.is_active() && s.is_user(&self.exempt_account))
    }

    /// Whether the host should be shut down right now
    pub fn should_shut_down(&self, hour: u8, sessions: &[Session]) -> bool {
        self.in_window(hour) && !self.has_exempt_session(sessions)
    }

    /// Message shown to logged-in users during the countdown
    pub fn shutdown_message(&self) -> String {
        format!(
            "Restricted usage window ({}): this computer will shut down in {} seconds.",
            self.window,
            self.shutdown_delay.as_secs()
        )
    }

    pub fn shutdown_request(&self) -> ShutdownRequest {
        ShutdownRequest::new(self.shutdown_delay, self.shutdown_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curfew_api::SessionActivity;

    #[test]
    fn window_boundaries() {
        let policy = GuardPolicy::default();
        assert!(policy.in_window(21));
        assert!(policy.in_window(23));
        assert!(policy.in_window(0));
        assert!(policy.in_window(10));
        assert!(!policy.in_window(11));
        assert!(!policy.in_window(15));
        assert!(!policy.in_window(20));
    }

    #[test]
    fn decision_table() {
        let policy = GuardPolicy::default();
        let alice = vec![Session::active("alice")];
        let admin = vec![Session::active("Administrator")];
        let mixed = vec![Session::active("alice"), Session::active("ADMINISTRATOR")];

        assert!(policy.should_shut_down(22, &alice));
        assert!(!policy.should_shut_down(22, &admin));
        assert!(!policy.should_shut_down(22, &mixed));
        assert!(!policy.should_shut_down(15, &alice));
        assert!(policy.should_shut_down(3, &[]));
        assert!(!policy.should_shut_down(12, &[]));
    }

    #[test]
    fn inactive_exempt_session_does_not_count() {
        let policy = GuardPolicy::default();
        let sessions = vec![Session::new("administrator", SessionActivity::Inactive)];
        assert!(!policy.has_exempt_session(&sessions));
        assert!(policy.should_shut_down(23, &sessions));
    }

    #[test]
    fn exempt_match_is_whole_name() {
        let policy = GuardPolicy::default();
        assert!(!policy.has_exempt_session(&[Session::active("administrator2")]));
        assert!(!policy.has_exempt_session(&[Session::active("admin")]));
    }

    #[test]
    fn shutdown_request_carries_delay_and_message() {
        let request = GuardPolicy::default().shutdown_request();
        assert_eq!(request.delay, Duration::from_secs(60));
        assert!(request.message.contains("21:00 - 11:00"));
        assert!(request.message.contains("60 seconds"));
    }
}
