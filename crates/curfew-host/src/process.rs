//! Host command execution

use curfew_host_api::{HostError, HostResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished host command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into an error
    pub fn require_success(self, program: &str) -> HostResult<Self> {
        if self.success() {
            return Ok(self);
        }

        let detail = match self.stderr.trim() {
            "" => self.stdout.trim(),
            stderr => stderr,
        };
        Err(HostError::CommandFailed {
            program: program.to_string(),
            message: format!(
                "exited {}: {}",
                self.code.map_or_else(|| "by signal".to_string(), |c| c.to_string()),
                detail
            ),
        })
    }
}

/// Run a command to completion with a time limit.
///
/// The child is killed if the limit expires or the returned future is dropped.
pub async fn run_command(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> HostResult<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| HostError::CommandFailed {
        program: program.to_string(),
        message: format!("failed to spawn: {}", e),
    })?;

    debug!(program = %program, pid = ?child.id(), "Host command spawned");

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(HostError::Timeout {
                program: program.to_string(),
                timeout,
            });
        }
    };

    let output = CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    debug!(program = %program, code = ?output.code, "Host command finished");

    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn captures_stdout() {
        let output = run_command("echo", &["hello".to_string()], LIMIT)
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let output = run_command("false", &[], LIMIT).await.unwrap();
        assert!(!output.success());
        assert!(matches!(
            output.require_success("false"),
            Err(HostError::CommandFailed { program, .. }) if program == "false"
        ));
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let result = run_command("/nonexistent/curfew-test-binary", &[], LIMIT).await;
        assert!(matches!(result, Err(HostError::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let result = run_command(
            "sleep",
            &["5".to_string()],
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(HostError::Timeout { .. })));
    }
}
