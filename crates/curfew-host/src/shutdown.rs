//! Shutdown dispatch through host commands

use async_trait::async_trait;
use curfew_api::{CommandSpec, FallbackStrategy};
use curfew_config::ShutdownConfig;
use curfew_host_api::{
    DispatchReceipt, HostError, HostResult, ShutdownDispatcher, ShutdownRequest,
};
use std::time::Duration;
use tracing::{info, warn};

use crate::run_command;

/// Runs the configured shutdown command, then fallbacks per [`FallbackStrategy`]
#[derive(Debug, Clone)]
pub struct CommandShutdownDispatcher {
    mechanisms: Vec<CommandSpec>,
    strategy: FallbackStrategy,
    timeout: Duration,
}

impl CommandShutdownDispatcher {
    pub fn new(config: &ShutdownConfig) -> Self {
        Self {
            mechanisms: config.mechanisms().cloned().collect(),
            strategy: config.strategy,
            timeout: config.timeout,
        }
    }

    async fn run_mechanism(&self, cmd: &CommandSpec, request: &ShutdownRequest) -> HostResult<()> {
        let delay = request.delay_seconds().to_string();
        let delay_minutes = request.delay_minutes().to_string();
        let args = cmd.expand_args(&[
            ("delay", delay.as_str()),
            ("delay_minutes", delay_minutes.as_str()),
            ("message", request.message.as_str()),
        ]);

        run_command(&cmd.program, &args, self.timeout)
            .await?
            .require_success(&cmd.program)?;
        Ok(())
    }
}

#[async_trait]
impl ShutdownDispatcher for CommandShutdownDispatcher {
    async fn dispatch(&self, request: &ShutdownRequest) -> HostResult<DispatchReceipt> {
        let mut attempts = 0;
        let mut last_success = None;
        let mut failures = Vec::new();

        for cmd in &self.mechanisms {
            attempts += 1;
            match self.run_mechanism(cmd, request).await {
                Ok(()) => {
                    info!(program = %cmd.program, attempt = attempts, "Shutdown mechanism accepted");
                    last_success = Some(cmd.program.clone());
                    if self.strategy == FallbackStrategy::FirstSuccess {
                        break;
                    }
                }
                Err(e) => {
                    warn!(program = %cmd.program, error = %e, "Shutdown mechanism failed");
                    failures.push(e.to_string());
                }
            }
        }

        match last_success {
            Some(mechanism) => Ok(DispatchReceipt {
                mechanism,
                attempts,
            }),
            None if failures.is_empty() => Err(HostError::DispatchFailed(
                "no shutdown mechanism configured".into(),
            )),
            None => Err(HostError::DispatchFailed(failures.join("; "))),
        }
    }
}
