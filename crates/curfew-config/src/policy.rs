//! Validated configuration structures

use crate::schema::{RawCommand, RawConfig, RawGuardConfig, RawSessionQuery, RawShutdownConfig};
use crate::validation::{parse_fallback_strategy, parse_inspection_failure};
use curfew_api::{CommandSpec, FallbackStrategy, InspectionFailurePolicy, SessionTableFormat};
use std::time::Duration;

/// Default seconds between guard evaluations
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Default limit for a single host command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Validated configuration ready for use by the daemon
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub tick_interval: Duration,
    pub inspection_failure: InspectionFailurePolicy,
    pub sessions: SessionQueryConfig,
    pub shutdown: ShutdownConfig,
}

impl GuardConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let (tick_interval, inspection_failure) = convert_guard(raw.guard);

        Self {
            tick_interval,
            inspection_failure,
            sessions: SessionQueryConfig::from_raw(raw.sessions),
            shutdown: ShutdownConfig::from_raw(raw.shutdown),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            inspection_failure: InspectionFailurePolicy::default(),
            sessions: SessionQueryConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

/// How to enumerate login sessions
#[derive(Debug, Clone)]
pub struct SessionQueryConfig {
    pub command: CommandSpec,
    pub format: SessionTableFormat,
    pub timeout: Duration,
}

impl SessionQueryConfig {
    fn from_raw(raw: RawSessionQuery) -> Self {
        let defaults = Self::default();

        let command = CommandSpec {
            program: raw.program.unwrap_or(defaults.command.program),
            args: raw.args.unwrap_or(defaults.command.args),
        };

        let format = SessionTableFormat {
            active_marker: override_marker(raw.active_marker, defaults.format.active_marker),
            decoy_marker: override_marker(raw.decoy_marker, defaults.format.decoy_marker),
            current_marker: raw
                .current_marker
                .unwrap_or(defaults.format.current_marker),
            user_column: raw.user_column.unwrap_or(defaults.format.user_column),
        };

        Self {
            command,
            format,
            timeout: raw
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(windows)]
impl Default for SessionQueryConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new("query", ["user"]),
            format: SessionTableFormat::query_user(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

#[cfg(not(windows))]
impl Default for SessionQueryConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new("who", ["-H"]),
            format: SessionTableFormat::who(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// How to shut the host down
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    pub primary: CommandSpec,
    pub fallbacks: Vec<CommandSpec>,
    pub strategy: FallbackStrategy,
    pub timeout: Duration,
}

impl ShutdownConfig {
    fn from_raw(raw: RawShutdownConfig) -> Self {
        let defaults = Self::default();

        let primary = CommandSpec {
            program: raw.program.unwrap_or(defaults.primary.program),
            args: raw.args.unwrap_or(defaults.primary.args),
        };

        Self {
            primary,
            fallbacks: raw.fallbacks.into_iter().map(convert_command).collect(),
            strategy: raw
                .strategy
                .as_deref()
                .and_then(|s| parse_fallback_strategy(s).ok())
                .unwrap_or_default(),
            timeout: raw
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Primary mechanism followed by the fallbacks, in order
    pub fn mechanisms(&self) -> impl Iterator<Item = &CommandSpec> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter())
    }
}

#[cfg(windows)]
impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            primary: CommandSpec::new("shutdown", ["/s", "/t", "{delay}", "/c", "{message}"]),
            fallbacks: Vec::new(),
            strategy: FallbackStrategy::default(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

#[cfg(not(windows))]
impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            primary: CommandSpec::new("shutdown", ["-h", "+{delay_minutes}", "{message}"]),
            fallbacks: Vec::new(),
            strategy: FallbackStrategy::default(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

// Conversion helpers

fn convert_guard(raw: RawGuardConfig) -> (Duration, InspectionFailurePolicy) {
    let tick_interval = raw
        .tick_interval_seconds
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TICK_INTERVAL);
    let inspection_failure = raw
        .inspection_failure
        .as_deref()
        .and_then(|s| parse_inspection_failure(s).ok())
        .unwrap_or_default();

    (tick_interval, inspection_failure)
}

fn convert_command(raw: RawCommand) -> CommandSpec {
    CommandSpec {
        program: raw.program,
        args: raw.args,
    }
}

/// Unset keeps the default; an empty string disables the marker
fn override_marker(raw: Option<String>, default: Option<String>) -> Option<String> {
    match raw {
        Some(marker) if marker.is_empty() => None,
        Some(marker) => Some(marker),
        None => default,
    }
}
