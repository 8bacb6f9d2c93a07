//! Default paths for curfewd
//!
//! The guard runs as a system service, so the configuration lives in a
//! system-wide location:
//! - Unix: `/etc/curfew/curfew.toml`
//! - Windows: `%ProgramData%\curfew\curfew.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config path
pub const CURFEW_CONFIG_ENV: &str = "CURFEW_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "curfew";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "curfew.toml";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$CURFEW_CONFIG` environment variable (if set)
/// 2. The platform system config directory
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CURFEW_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the `CURFEW_CONFIG` env var.
pub fn config_path_without_env() -> PathBuf {
    system_config_dir().join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(windows)]
fn system_config_dir() -> PathBuf {
    std::env::var("ProgramData")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(r"C:\ProgramData"))
}

#[cfg(not(windows))]
fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc")
}
