//! Session table query
//!
//! The host's session listing is a text table: a header row followed by one
//! row per login. A row counts only if it carries the active marker and not
//! the decoy marker. The caller's own session is prefixed with a marker
//! (`>` for `query user`) that must be stripped before reading the user name.

use async_trait::async_trait;
use curfew_api::{CommandSpec, Session, SessionTableFormat};
use curfew_config::SessionQueryConfig;
use curfew_host_api::{HostResult, SessionInspector};
use std::time::Duration;
use tracing::debug;

use crate::run_command;

/// Parse the session table, returning only active sessions.
pub fn parse_session_table(output: &str, format: &SessionTableFormat) -> Vec<Session> {
    output
        .lines()
        .skip(1) // header
        .filter(|line| is_active_row(line, format))
        .filter_map(|line| row_user(line, format))
        .map(Session::active)
        .collect()
}

fn is_active_row(line: &str, format: &SessionTableFormat) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    if let Some(marker) = &format.active_marker
        && !line.contains(marker.as_str())
    {
        return false;
    }
    if let Some(decoy) = &format.decoy_marker
        && line.contains(decoy.as_str())
    {
        return false;
    }
    true
}

fn row_user(line: &str, format: &SessionTableFormat) -> Option<String> {
    let line = line.trim();
    let line = line
        .strip_prefix(format.current_marker.as_str())
        .unwrap_or(line)
        .trim();

    line.split_whitespace()
        .nth(format.user_column)
        .map(str::to_string)
}

/// Session inspector backed by an external listing command
#[derive(Debug, Clone)]
pub struct CommandSessionInspector {
    command: CommandSpec,
    format: SessionTableFormat,
    timeout: Duration,
}

impl CommandSessionInspector {
    pub fn new(config: &SessionQueryConfig) -> Self {
        Self {
            command: config.command.clone(),
            format: config.format.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl SessionInspector for CommandSessionInspector {
    async fn list_active_sessions(&self) -> HostResult<Vec<Session>> {
        let output = run_command(&self.command.program, &self.command.args, self.timeout)
            .await?
            .require_success(&self.command.program)?;

        let sessions = parse_session_table(&output.stdout, &self.format);
        debug!(
            command = %self.command,
            count = sessions.len(),
            "Session table parsed"
        );

        Ok(sessions)
    }
}
