//! Diagnostics emitted during a run and the final report.

use crate::core::TransitionHistory;
use crate::notification::NotificationError;
use crate::source::SourceError;
use crate::validator::{Verdict, Violation};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// One human-readable event of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A notification was evaluated.
    Verdict(Verdict),
    /// A notification line could not be decoded and was skipped.
    Malformed(NotificationError),
}

impl Diagnostic {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Verdict(verdict) if verdict.is_fatal())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verdict(verdict) => write!(f, "{verdict}"),
            Self::Malformed(error) => write!(f, "SKIPPED: {error}"),
        }
    }
}

/// Pass/fail determination of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run duration elapsed without a fatal violation.
    Passed,
    /// The run stopped on this violation.
    Failed(Violation),
}

impl RunOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Summary of a finished run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    /// Wall-clock start, for correlating with device logs
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Notifications accepted, including the first one
    pub accepted: usize,
    /// Tolerated early exits
    pub warnings: usize,
    /// Prefixed lines whose payload was not a state ordinal
    pub malformed: usize,
    /// Lines that were not notifications
    pub ignored: usize,
    /// Non-fatal transitions, in order
    pub history: TransitionHistory,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            RunOutcome::Passed => write!(
                f,
                "Test passed without any errors ({} transitions, {} warnings)",
                self.history.len(),
                self.warnings
            ),
            RunOutcome::Failed(violation) => write!(f, "Test failed: {violation}"),
        }
    }
}

/// Errors that prevent a run from reaching a verdict.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Line source closed after {elapsed_ms} ms, before the run duration elapsed")]
    SourceClosed { elapsed_ms: u64 },
}
