//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Loop settings
    #[serde(default)]
    pub guard: RawGuardConfig,

    /// Session query command
    #[serde(default)]
    pub sessions: RawSessionQuery,

    /// Shutdown command and fallbacks
    #[serde(default)]
    pub shutdown: RawShutdownConfig,
}

/// Guard loop settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawGuardConfig {
    /// Seconds between evaluations (default: 60)
    pub tick_interval_seconds: Option<u64>,

    /// "assume_no_sessions" or "assume_exempt"
    pub inspection_failure: Option<String>,
}

/// Session query settings. Unset fields use the platform default;
/// an empty marker string disables that marker.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionQuery {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub active_marker: Option<String>,
    pub decoy_marker: Option<String>,
    pub current_marker: Option<String>,
    pub user_column: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

/// Shutdown settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawShutdownConfig {
    pub program: Option<String>,

    /// Argument templates; `{delay}`, `{delay_minutes}` and `{message}` are expanded
    pub args: Option<Vec<String>>,

    /// "first_success" or "broadcast"
    pub strategy: Option<String>,

    pub timeout_seconds: Option<u64>,

    /// Alternate mechanisms, in order
    #[serde(default)]
    pub fallbacks: Vec<RawCommand>,
}

/// An external command
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_sections() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert_eq!(config.config_version, 1);
        assert!(config.guard.tick_interval_seconds.is_none());
        assert!(config.sessions.program.is_none());
        assert!(config.shutdown.fallbacks.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [guard]
            tick_interval_seconds = 30
            inspection_failure = "assume_exempt"

            [sessions]
            program = "query"
            args = ["user"]
            active_marker = "Active"
            decoy_marker = "运行中"
            current_marker = ">"
            user_column = 0
            timeout_seconds = 10

            [shutdown]
            program = "shutdown"
            args = ["/s", "/t", "{delay}", "/c", "{message}"]
            strategy = "broadcast"

            [[shutdown.fallbacks]]
            program = "powershell"
            args = ["-NoProfile", "-Command", "Stop-Computer -Force"]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.guard.tick_interval_seconds, Some(30));
        assert_eq!(config.sessions.decoy_marker.as_deref(), Some("运行中"));
        assert_eq!(config.shutdown.args.as_ref().unwrap().len(), 5);
        assert_eq!(config.shutdown.fallbacks.len(), 1);
        assert_eq!(config.shutdown.fallbacks[0].program, "powershell");
    }
}
