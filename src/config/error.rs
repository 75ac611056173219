//! Configuration errors.

use thiserror::Error;

/// Errors that can occur when loading or validating a [`CheckConfig`](super::CheckConfig).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Serial port must not be empty")]
    EmptyPort,

    #[error("Baud rate must be greater than zero")]
    ZeroBaudRate,

    #[error("Run duration must be greater than zero seconds")]
    ZeroDuration,

    #[error("Invalid configuration: {}", join(.0))]
    Invalid(Vec<ConfigError>),
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
