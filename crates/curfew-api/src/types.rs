//! Shared types for the guard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity state of a login session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionActivity {
    Active,
    Inactive,
}

/// A login session as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// User name as printed by the host
    pub user: String,
    pub activity: SessionActivity,
}

impl Session {
    pub fn new(user: impl Into<String>, activity: SessionActivity) -> Self {
        Self {
            user: user.into(),
            activity,
        }
    }

    pub fn active(user: impl Into<String>) -> Self {
        Self::new(user, SessionActivity::Active)
    }

    pub fn is_active(&self) -> bool {
        self.activity == SessionActivity::Active
    }

    /// Case-insensitive user name comparison
    pub fn is_user(&self, name: &str) -> bool {
        self.user.to_lowercase() == name.to_lowercase()
    }
}

/// Debounce state of the guard loop
///
/// `Triggered` means a shutdown has already been dispatched for the
/// current qualifying interval and must not be repeated until a
/// non-qualifying tick is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    #[default]
    Idle,
    Triggered,
}

impl GuardState {
    /// Apply one tick's decision.
    ///
    /// Returns the next state and whether a dispatch must be issued.
    pub fn advance(self, go: bool) -> (GuardState, bool) {
        match (self, go) {
            (_, false) => (GuardState::Idle, false),
            (GuardState::Idle, true) => (GuardState::Triggered, true),
            (GuardState::Triggered, true) => (GuardState::Triggered, false),
        }
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardState::Idle => write!(f, "idle"),
            GuardState::Triggered => write!(f, "triggered"),
        }
    }
}

/// What the guard assumes when the session query itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionFailurePolicy {
    /// Treat a failed query as "nobody logged in". Inside the window this
    /// leads to a shutdown.
    #[default]
    AssumeNoSessions,
    /// Treat a failed query as if the exempt account were present.
    AssumeExempt,
}

/// How the shutdown dispatcher uses its fallback mechanisms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Stop at the first mechanism that succeeds
    #[default]
    FirstSuccess,
    /// Run every mechanism on each dispatch
    Broadcast,
}

/// Placeholders understood in shutdown command arguments
pub const SHUTDOWN_PLACEHOLDERS: &[&str] = &["delay", "delay_minutes", "message"];

/// An external command with argument templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Names of `{placeholder}` tokens used in the arguments
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for arg in &self.args {
            let mut rest = arg.as_str();
            while let Some(open) = rest.find('{') {
                let after = &rest[open + 1..];
                let Some(close) = after.find('}') else {
                    break;
                };
                names.push(&after[..close]);
                rest = &after[close + 1..];
            }
        }
        names
    }

    /// Arguments with every `{name}` replaced by its value.
    ///
    /// Each argument is scanned once; substituted text is never expanded
    /// again, and unknown tokens are kept as written.
    pub fn expand_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args.iter().map(|arg| expand_one(arg, vars)).collect()
    }
}

fn expand_one(arg: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };

        let name = &after[..close];
        match vars.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Layout of the session query's text table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTableFormat {
    /// Row must contain this to count as active. `None` accepts every row.
    pub active_marker: Option<String>,
    /// Row containing this is rejected even if it has the active marker
    pub decoy_marker: Option<String>,
    /// Prefix marking the caller's own session
    pub current_marker: String,
    /// Whitespace-delimited field holding the user name
    pub user_column: usize,
}

impl SessionTableFormat {
    /// Layout of the Windows `query user` table
    pub fn query_user() -> Self {
        Self {
            active_marker: Some("Active".into()),
            decoy_marker: Some("运行中".into()),
            current_marker: ">".into(),
            user_column: 0,
        }
    }

    /// Layout of `who -H`; every listed login is interactive
    pub fn who() -> Self {
        Self {
            active_marker: None,
            decoy_marker: None,
            current_marker: ">".into(),
            user_column: 0,
        }
    }
}
