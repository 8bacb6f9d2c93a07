//! Per-tick evaluation records

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::GuardState;

/// What happened when a dispatch was attempted on this tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The host accepted the shutdown request
    Issued {
        mechanism: String,
        attempts: usize,
    },
    /// Every mechanism failed; the guard stays triggered
    Failed { error: String },
}

/// Result of one guard evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub timestamp: DateTime<Local>,
    pub hour: u8,
    pub in_window: bool,
    /// Users with an active session (empty when not queried)
    pub active_users: Vec<String>,
    pub exempt: bool,
    /// The session query failed and the failure policy was applied
    pub inspection_failed: bool,
    pub go: bool,
    /// Guard state after this tick
    pub state: GuardState,
    pub dispatch: Option<DispatchOutcome>,
}

impl TickReport {
    pub fn dispatched(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Single-line JSON rendering for foreground status output
    pub fn to_status_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
