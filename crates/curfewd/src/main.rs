//! curfewd - The restricted-window shutdown guard
//!
//! This is the main entry point for the guard service.
//! It wires together all the components:
//! - Configuration loading
//! - Host adapters (session query, shutdown dispatch)
//! - Guard engine and loop
//! - Service status reporting and control signals
//!
//! On Windows the service is started by the Service Control Manager unless
//! `--foreground` is given.

#[cfg(windows)]
mod scm_main;

use anyhow::{Context, Result};
use clap::Parser;
use curfew_config::{GuardConfig, load_config, load_config_or_default};
use curfew_core::{GuardEngine, GuardLoop, GuardPolicy, ServiceError, run_service};
use curfew_host::{
    CommandSessionInspector, CommandShutdownDispatcher, LogReporter, spawn_signal_controls,
};
use curfew_host_api::StatusReporter;
use curfew_util::{
    CURFEW_CONFIG_ENV, SystemClock, default_config_path, format_datetime_full,
    is_mock_time_active, now,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// curfewd - Shuts the computer down during the restricted usage window
#[derive(Parser, Debug)]
#[command(name = "curfewd")]
#[command(about = "Shuts the computer down during the restricted usage window", long_about = None)]
struct Args {
    /// Configuration file path (or set CURFEW_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Run unsupervised: log status changes and print one JSON line per tick
    #[arg(short, long)]
    foreground: bool,
}

fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries tick reports in foreground mode
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// An explicitly named config must exist; the default location may be absent.
fn load_guard_config(args: &Args) -> Result<(PathBuf, GuardConfig)> {
    let explicit = args.config.is_some() || std::env::var_os(CURFEW_CONFIG_ENV).is_some();
    let path = args.config.clone().unwrap_or_else(default_config_path);

    let config = if explicit {
        load_config(&path)
    } else {
        load_config_or_default(&path)
    }
    .with_context(|| format!("Failed to load config from {:?}", path))?;

    Ok((path, config))
}

#[cfg(unix)]
fn warn_if_unprivileged() {
    if !nix::unistd::geteuid().is_root() {
        warn!("Not running as root; session queries or shutdown may be refused by the host");
    }
}

#[cfg(not(unix))]
fn warn_if_unprivileged() {}

#[cfg(unix)]
fn make_reporter(foreground: bool) -> Result<Box<dyn StatusReporter>> {
    if !foreground
        && let Some(notifier) = curfew_host::SystemdNotifier::from_env()
            .context("Failed to open service manager notification socket")?
    {
        info!("Reporting status to systemd");
        return Ok(Box::new(notifier));
    }
    Ok(Box::new(LogReporter))
}

#[cfg(not(unix))]
fn make_reporter(_foreground: bool) -> Result<Box<dyn StatusReporter>> {
    Ok(Box::new(LogReporter))
}

fn build_guard(config: &GuardConfig, foreground: bool) -> Result<GuardLoop, curfew_util::CurfewError> {
    let engine = GuardEngine::new(
        GuardPolicy::default(),
        Arc::new(CommandSessionInspector::new(&config.sessions)),
        Arc::new(CommandShutdownDispatcher::new(&config.shutdown)),
        config.inspection_failure,
    );

    let guard = GuardLoop::new(engine, Arc::new(SystemClock), config.tick_interval)?;

    if foreground {
        Ok(guard.with_observer(|report| {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", report.to_status_line()) {
                warn!(error = %e, "Failed to write tick report");
            }
        }))
    } else {
        Ok(guard)
    }
}

fn log_startup(path: &Path, config: &GuardConfig) {
    let policy = GuardPolicy::default();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %path.display(),
        window = %policy.window(),
        exempt = %policy.exempt_account(),
        tick_secs = config.tick_interval.as_secs(),
        session_command = %config.sessions.command,
        shutdown_command = %config.shutdown.primary,
        fallbacks = config.shutdown.fallbacks.len(),
        "curfewd starting"
    );

    if is_mock_time_active() {
        warn!(now = %format_datetime_full(&now()), "Mock time is active");
    }
}

fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Run under systemd, or unsupervised with signals as controls
async fn run_console(config: GuardConfig, foreground: bool) -> Result<()> {
    let reporter = make_reporter(foreground)?;

    // Controls are installed after StartPending so a failure is reported
    let reason = run_service(reporter, move || {
        let guard = build_guard(&config, foreground)?;
        let controls = spawn_signal_controls().map_err(ServiceError::Controls)?;
        Ok((guard, controls))
    })
    .await?;

    info!(reason = %reason, "curfewd exiting");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let (path, config) = load_guard_config(&args)?;
    log_startup(&path, &config);
    warn_if_unprivileged();

    #[cfg(windows)]
    if !args.foreground && scm_main::dispatch(&config) {
        return Ok(());
    }

    let runtime = build_runtime().context("Failed to start async runtime")?;
    runtime.block_on(run_console(config, args.foreground))
}
