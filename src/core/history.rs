//! History of transitions observed during a run.
//!
//! `record` returns a new history with the transition appended and leaves
//! the original untouched. The owner of a history appends with `push`.

use super::state::TrafficState;
use super::timing::MonotonicMillis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A transition the validator did not reject.
///
/// # Example
///
/// ```rust
/// use trafficcheck::core::{MonotonicMillis, ObservedTransition, TrafficState};
///
/// let transition = ObservedTransition {
///     from: TrafficState::CarsPass,
///     to: TrafficState::CarsWarning,
///     elapsed_ms: 16005,
///     error_ms: 5,
///     early_exit: false,
///     at: MonotonicMillis(16005),
/// };
/// assert_eq!(transition.error_ms.unsigned_abs(), 5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservedTransition {
    /// The state the device left
    pub from: TrafficState,
    /// The state the device entered
    pub to: TrafficState,
    /// Measured dwell time in `from`
    pub elapsed_ms: u64,
    /// `elapsed_ms` minus the expected dwell time of `from`
    pub error_ms: i64,
    /// Whether the transition was a tolerated early exit
    pub early_exit: bool,
    /// When the notification was read, on the run's monotonic clock
    pub at: MonotonicMillis,
}

/// Ordered history of observed transitions.
///
/// # Example
///
/// ```rust
/// use trafficcheck::core::{MonotonicMillis, ObservedTransition, TrafficState, TransitionHistory};
///
/// let history = TransitionHistory::new().record(ObservedTransition {
///     from: TrafficState::CarsPass,
///     to: TrafficState::CarsWarning,
///     elapsed_ms: 16000,
///     error_ms: 0,
///     early_exit: false,
///     at: MonotonicMillis(16000),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path, vec![TrafficState::CarsPass, TrafficState::CarsWarning]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    transitions: Vec<ObservedTransition>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, transition: ObservedTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append a transition in place.
    pub fn push(&mut self, transition: ObservedTransition) {
        self.transitions.push(transition);
    }

    /// States traversed: the first `from`, then the `to` of each transition.
    pub fn get_path(&self) -> Vec<TrafficState> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Span between the first and last recorded transitions.
    ///
    /// Returns `None` if nothing was recorded.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.first()?, self.transitions.last()?);
        Some(Duration::from_millis(last.at.saturating_since(first.at)))
    }

    /// Largest absolute timing error among transitions that were not early exits.
    pub fn max_abs_error(&self) -> Option<u64> {
        self.transitions
            .iter()
            .filter(|t| !t.early_exit)
            .map(|t| t.error_ms.unsigned_abs())
            .max()
    }

    /// Number of tolerated early exits.
    pub fn early_exits(&self) -> usize {
        self.transitions.iter().filter(|t| t.early_exit).count()
    }

    pub fn transitions(&self) -> &[ObservedTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
