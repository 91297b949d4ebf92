//! Core error types for pomocycle-core.
//!
//! Configuration problems are fatal at startup; transition errors are
//! recoverable and only tell the caller its command was ignored.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::{Command, Phase};

/// Core error type for pomocycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A command was rejected by the timer
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// The runtime task is gone (shut down or panicked)
    #[error("Timer runtime is no longer running")]
    RuntimeClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// A command issued in a state that does not accept it.
///
/// The timer is left untouched; callers usually log and carry on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {command} while {phase}")]
pub struct InvalidTransition {
    pub command: Command,
    pub phase: Phase,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
