//! Error types for curfewd

use thiserror::Error;

/// Core error type for curfewd operations
#[derive(Debug, Error)]
pub enum CurfewError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CurfewError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CurfewError>;
