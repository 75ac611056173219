//! Monotonic timing and dwell-time classification.

use super::state::TrafficState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Milliseconds on a monotonic clock.
///
/// Only differences between two readings of the same clock are meaningful.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct MonotonicMillis(pub u64);

impl MonotonicMillis {
    /// Milliseconds elapsed since `earlier`, or `None` if `earlier` is later
    /// than `self`.
    pub fn checked_since(self, earlier: MonotonicMillis) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    /// Milliseconds elapsed since `earlier`, clamped at zero.
    pub fn saturating_since(self, earlier: MonotonicMillis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for MonotonicMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ms", self.0)
    }
}

/// Source of monotonic timestamps.
pub trait Clock {
    fn now(&self) -> MonotonicMillis;
}

/// Clock anchored on [`Instant`] at construction time.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> MonotonicMillis {
        let millis = self.origin.elapsed().as_millis();
        MonotonicMillis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

/// Expected dwell time of every state, in milliseconds.
///
/// Total over [`TrafficState`]: lookups are an exhaustive `match`, never a
/// fallible map access.
///
/// # Example
///
/// ```rust
/// use trafficcheck::core::{DelayTable, TrafficState};
///
/// let delays = DelayTable::from_device_delays(8000, 4000, 16000);
/// assert_eq!(delays.expected(TrafficState::CarsPass), 16000);
/// assert_eq!(delays.expected(TrafficState::PedestriansWarning), 4000);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DelayTable {
    pub pedestrians_pass_ms: u64,
    pub pedestrians_warning_ms: u64,
    pub cars_warning_ms: u64,
    pub cars_pass_ms: u64,
}

impl DelayTable {
    /// Build the table from the three timers the firmware is configured with.
    /// Both warning states share `warning_ms`.
    pub fn from_device_delays(pedestrians_ms: u64, warning_ms: u64, cars_ms: u64) -> Self {
        Self {
            pedestrians_pass_ms: pedestrians_ms,
            pedestrians_warning_ms: warning_ms,
            cars_warning_ms: warning_ms,
            cars_pass_ms: cars_ms,
        }
    }

    /// Expected dwell time in `state`.
    pub fn expected(&self, state: TrafficState) -> u64 {
        match state {
            TrafficState::PedestriansPass => self.pedestrians_pass_ms,
            TrafficState::PedestriansWarning => self.pedestrians_warning_ms,
            TrafficState::CarsWarning => self.cars_warning_ms,
            TrafficState::CarsPass => self.cars_pass_ms,
        }
    }
}

/// How a measured dwell time compares to its expectation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimingClass {
    /// `|error| <= tolerance`.
    WithinTolerance,
    /// Left a state that may be cut short, earlier than tolerated.
    EarlyExit,
    /// Any other deviation beyond tolerance.
    OutOfTolerance,
}

/// Signed dwell-time error: `elapsed - expected`, saturating at the `i64` range.
pub fn timing_error(elapsed_ms: u64, expected_ms: u64) -> i64 {
    let elapsed = i128::from(elapsed_ms);
    let expected = i128::from(expected_ms);
    let error = elapsed - expected;
    i64::try_from(error).unwrap_or(if error < 0 { i64::MIN } else { i64::MAX })
}

/// Classify a signed dwell-time error observed while leaving `state`.
///
/// Bounds are inclusive: an error of exactly `±tolerance_ms` is within
/// tolerance.
pub fn classify(state: TrafficState, error_ms: i64, tolerance_ms: u64) -> TimingClass {
    if error_ms.unsigned_abs() <= tolerance_ms {
        TimingClass::WithinTolerance
    } else if error_ms < 0 && state.allows_early_exit() {
        TimingClass::EarlyExit
    } else {
        TimingClass::OutOfTolerance
    }
}
