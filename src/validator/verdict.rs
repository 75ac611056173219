//! Per-notification verdicts.

use crate::core::{MonotonicMillis, TrafficState};
use std::fmt;
use thiserror::Error;

/// Outcome of evaluating one notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Legal and on time, or the first notification of the run.
    Accepted(Note),
    /// Legal but suspicious; the run continues.
    Warning(EarlyExit),
    /// The device broke its contract; the run must stop.
    FatalViolation(Violation),
}

impl Verdict {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalViolation(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted(note) => write!(f, "{note}"),
            Self::Warning(warning) => write!(f, "WARNING: {warning}"),
            Self::FatalViolation(violation) => write!(f, "FAILED: {violation}"),
        }
    }
}

/// Diagnostic carried by an accepted notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    /// First notification; nothing to compare against yet.
    Initial { state: TrafficState },
    /// Legal transition within tolerance.
    OnTime {
        from: TrafficState,
        to: TrafficState,
        elapsed_ms: u64,
        error_ms: i64,
    },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial { state } => write!(f, "Initial state is {state}"),
            Self::OnTime {
                from,
                to,
                elapsed_ms,
                error_ms,
            } => write!(
                f,
                "Switched from {from} to {to} after {elapsed_ms} ms with an error of {error_ms} ms"
            ),
        }
    }
}

/// Early exit from a state the pedestrian button may cut short.
///
/// Expected when the button was pressed; a fault otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EarlyExit {
    pub from: TrafficState,
    pub to: TrafficState,
    pub elapsed_ms: u64,
    pub error_ms: i64,
    pub tolerance_ms: u64,
}

impl fmt::Display for EarlyExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Negative delay error of {} ms leaving {} for {}, expected if the pedestrian button was pressed, an error otherwise",
            self.error_ms, self.from, self.to
        )
    }
}

/// Contract violations that end a run.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("Illegal switch from {from} to {to} (expected {expected})")]
    IllegalTransition {
        from: TrafficState,
        to: TrafficState,
        expected: TrafficState,
    },

    #[error("Delay error of {error_ms} ms from {from} to {to} after {elapsed_ms} ms (expected {expected_ms} ms). Tolerance is set at {tolerance_ms} ms")]
    TimingViolation {
        from: TrafficState,
        to: TrafficState,
        elapsed_ms: u64,
        expected_ms: u64,
        error_ms: i64,
        tolerance_ms: u64,
    },

    #[error("Clock went backwards: notification at {observed} precedes previous transition at {previous}")]
    NonMonotonicClock {
        previous: MonotonicMillis,
        observed: MonotonicMillis,
    },
}
