//! Notification parse errors.

use thiserror::Error;

/// A line carried the notification prefix but not a valid state ordinal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Malformed notification {line:?}: payload {payload:?} is not an integer")]
    NotAnInteger { line: String, payload: String },

    /// An integer outside `0..=3`, however large.
    #[error("Malformed notification {line:?}: {payload} is not a state ordinal (0-3)")]
    UnknownOrdinal { line: String, payload: String },
}

impl NotificationError {
    /// The offending line as received.
    pub fn line(&self) -> &str {
        match self {
            Self::NotAnInteger { line, .. } | Self::UnknownOrdinal { line, .. } => line,
        }
    }
}
