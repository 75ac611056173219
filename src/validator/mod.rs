//! Transition and timing validation.
//!
//! A [`Validator`] owns the [`RunState`] of one test run. Evaluation is split
//! in two: [`Validator::judge`] is a pure function of the current run state,
//! and [`Validator::apply`] commits the observation afterwards. Fatal
//! verdicts are never applied.

mod verdict;

pub use verdict::{EarlyExit, Note, Verdict, Violation};

use crate::core::{
    classify, timing_error, DelayTable, MonotonicMillis, ObservedTransition, TimingClass,
    TrafficState, TransitionHistory,
};

/// What the validator remembers between notifications.
///
/// The last observed state and its timestamp are stored as one pair, so they
/// are `None` together before the first notification and always move together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    current: Option<(TrafficState, MonotonicMillis)>,
}

impl RunState {
    /// Last state reported by the device.
    pub fn current_state(&self) -> Option<TrafficState> {
        self.current.map(|(state, _)| state)
    }

    /// Timestamp of the last accepted notification.
    pub fn last_transition(&self) -> Option<MonotonicMillis> {
        self.current.map(|(_, at)| at)
    }

    /// New run state after observing `state` at `at`.
    pub fn advance(self, state: TrafficState, at: MonotonicMillis) -> Self {
        Self {
            current: Some((state, at)),
        }
    }
}

/// Checks each notification against the transition table and the expected
/// dwell times.
///
/// # Example
///
/// ```rust
/// use trafficcheck::core::{DelayTable, MonotonicMillis, TrafficState};
/// use trafficcheck::validator::{Validator, Verdict};
///
/// let mut validator = Validator::new(DelayTable::from_device_delays(8000, 4000, 16000), 10);
///
/// let first = validator.evaluate(TrafficState::CarsPass, MonotonicMillis(0));
/// assert!(matches!(first, Verdict::Accepted(_)));
///
/// let second = validator.evaluate(TrafficState::CarsWarning, MonotonicMillis(16005));
/// assert!(matches!(second, Verdict::Accepted(_)));
///
/// let third = validator.evaluate(TrafficState::CarsPass, MonotonicMillis(20000));
/// assert!(third.is_fatal());
/// ```
#[derive(Clone, Debug)]
pub struct Validator {
    delays: DelayTable,
    tolerance_ms: u64,
    run_state: RunState,
    history: TransitionHistory,
}

impl Validator {
    pub fn new(delays: DelayTable, tolerance_ms: u64) -> Self {
        Self {
            delays,
            tolerance_ms,
            run_state: RunState::default(),
            history: TransitionHistory::new(),
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    pub fn delays(&self) -> &DelayTable {
        &self.delays
    }

    pub fn tolerance_ms(&self) -> u64 {
        self.tolerance_ms
    }

    /// Judge `incoming`, observed at `at`, and commit it unless fatal.
    pub fn evaluate(&mut self, incoming: TrafficState, at: MonotonicMillis) -> Verdict {
        let verdict = self.judge(incoming, at);
        self.apply(incoming, at, &verdict);
        verdict
    }

    /// Judge a notification against the current run state (pure).
    ///
    /// Legality is checked before timing: the dwell time of an illegal
    /// transition is meaningless.
    pub fn judge(&self, incoming: TrafficState, at: MonotonicMillis) -> Verdict {
        let Some((from, previous)) = self.run_state.current else {
            return Verdict::Accepted(Note::Initial { state: incoming });
        };

        let expected = from.successor();
        if incoming != expected {
            return Verdict::FatalViolation(Violation::IllegalTransition {
                from,
                to: incoming,
                expected,
            });
        }

        let Some(elapsed_ms) = at.checked_since(previous) else {
            return Verdict::FatalViolation(Violation::NonMonotonicClock {
                previous,
                observed: at,
            });
        };

        let expected_ms = self.delays.expected(from);
        let error_ms = timing_error(elapsed_ms, expected_ms);

        match classify(from, error_ms, self.tolerance_ms) {
            TimingClass::WithinTolerance => Verdict::Accepted(Note::OnTime {
                from,
                to: incoming,
                elapsed_ms,
                error_ms,
            }),
            TimingClass::EarlyExit => Verdict::Warning(EarlyExit {
                from,
                to: incoming,
                elapsed_ms,
                error_ms,
                tolerance_ms: self.tolerance_ms,
            }),
            TimingClass::OutOfTolerance => Verdict::FatalViolation(Violation::TimingViolation {
                from,
                to: incoming,
                elapsed_ms,
                expected_ms,
                error_ms,
                tolerance_ms: self.tolerance_ms,
            }),
        }
    }

    /// Commit an observation after it has been judged.
    ///
    /// A fatal verdict leaves the run state untouched.
    pub fn apply(&mut self, incoming: TrafficState, at: MonotonicMillis, verdict: &Verdict) {
        let observed = match *verdict {
            Verdict::FatalViolation(_) => return,
            Verdict::Accepted(Note::Initial { .. }) => None,
            Verdict::Accepted(Note::OnTime {
                from,
                to,
                elapsed_ms,
                error_ms,
            }) => Some((from, to, elapsed_ms, error_ms, false)),
            Verdict::Warning(EarlyExit {
                from,
                to,
                elapsed_ms,
                error_ms,
                ..
            }) => Some((from, to, elapsed_ms, error_ms, true)),
        };

        if let Some((from, to, elapsed_ms, error_ms, early_exit)) = observed {
            self.history.push(ObservedTransition {
                from,
                to,
                elapsed_ms,
                error_ms,
                early_exit,
                at,
            });
        }
        self.run_state = self.run_state.advance(incoming, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(tolerance_ms: u64) -> Validator {
        Validator::new(
            DelayTable::from_device_delays(8000, 4000, 16000),
            tolerance_ms,
        )
    }

    #[test]
    fn first_notification_initializes_run_state() {
        let mut v = validator(10);
        assert_eq!(v.run_state().current_state(), None);
        assert_eq!(v.run_state().last_transition(), None);

        let verdict = v.evaluate(TrafficState::PedestriansWarning, MonotonicMillis(42));

        assert_eq!(
            verdict,
            Verdict::Accepted(Note::Initial {
                state: TrafficState::PedestriansWarning
            })
        );
        assert_eq!(
            v.run_state().current_state(),
            Some(TrafficState::PedestriansWarning)
        );
        assert_eq!(v.run_state().last_transition(), Some(MonotonicMillis(42)));
        assert!(v.history().is_empty());
    }

    #[test]
    fn legal_on_time_transition_is_accepted() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));

        let verdict = v.evaluate(TrafficState::CarsWarning, MonotonicMillis(16000));

        assert_eq!(
            verdict,
            Verdict::Accepted(Note::OnTime {
                from: TrafficState::CarsPass,
                to: TrafficState::CarsWarning,
                elapsed_ms: 16000,
                error_ms: 0,
            })
        );
        assert_eq!(v.history().len(), 1);
        assert_eq!(v.history().transitions()[0].at, MonotonicMillis(16000));
    }

    #[test]
    fn apply_is_deterministic() {
        let run = || {
            let mut v = validator(10);
            v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));
            v.evaluate(TrafficState::CarsWarning, MonotonicMillis(16005));
            v.evaluate(TrafficState::PedestriansPass, MonotonicMillis(20003));
            v.history().clone()
        };

        assert_eq!(run().transitions(), run().transitions());
    }

    #[test]
    fn illegal_transition_is_checked_before_timing() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));

        // Perfect timing does not excuse skipping CarsWarning.
        let verdict = v.evaluate(TrafficState::PedestriansPass, MonotonicMillis(16000));

        assert_eq!(
            verdict,
            Verdict::FatalViolation(Violation::IllegalTransition {
                from: TrafficState::CarsPass,
                to: TrafficState::PedestriansPass,
                expected: TrafficState::CarsWarning,
            })
        );
    }

    #[test]
    fn fatal_verdict_leaves_run_state_untouched() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));
        let before = v.run_state();

        let verdict = v.evaluate(TrafficState::CarsPass, MonotonicMillis(16000));

        assert!(verdict.is_fatal());
        assert_eq!(v.run_state(), before);
        assert!(v.history().is_empty());
    }

    #[test]
    fn early_exit_from_cars_pass_is_a_warning() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));

        let verdict = v.evaluate(TrafficState::CarsWarning, MonotonicMillis(16000 - 10 - 1));

        assert_eq!(
            verdict,
            Verdict::Warning(EarlyExit {
                from: TrafficState::CarsPass,
                to: TrafficState::CarsWarning,
                elapsed_ms: 15989,
                error_ms: -11,
                tolerance_ms: 10,
            })
        );
        assert_eq!(
            v.run_state().current_state(),
            Some(TrafficState::CarsWarning)
        );
        assert_eq!(v.history().early_exits(), 1);
    }

    #[test]
    fn early_exit_from_other_states_is_fatal() {
        let mut v = validator(10);
        v.evaluate(TrafficState::PedestriansPass, MonotonicMillis(0));

        let verdict = v.evaluate(TrafficState::PedestriansWarning, MonotonicMillis(7989));

        assert!(matches!(
            verdict,
            Verdict::FatalViolation(Violation::TimingViolation { error_ms: -11, .. })
        ));
    }

    #[test]
    fn late_exit_from_cars_pass_is_fatal() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));

        let verdict = v.evaluate(TrafficState::CarsWarning, MonotonicMillis(16011));

        assert!(matches!(
            verdict,
            Verdict::FatalViolation(Violation::TimingViolation { error_ms: 11, .. })
        ));
    }

    #[test]
    fn backwards_timestamp_is_fatal() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsWarning, MonotonicMillis(5000));

        let verdict = v.evaluate(TrafficState::PedestriansPass, MonotonicMillis(4999));

        assert_eq!(
            verdict,
            Verdict::FatalViolation(Violation::NonMonotonicClock {
                previous: MonotonicMillis(5000),
                observed: MonotonicMillis(4999),
            })
        );
    }

    #[test]
    fn judge_does_not_mutate() {
        let mut v = validator(10);
        v.evaluate(TrafficState::CarsPass, MonotonicMillis(0));
        let before = v.run_state();

        let _ = v.judge(TrafficState::CarsWarning, MonotonicMillis(16000));

        assert_eq!(v.run_state(), before);
    }

    #[test]
    fn validators_are_independent() {
        let mut a = validator(10);
        let mut b = validator(10);
        a.evaluate(TrafficState::CarsPass, MonotonicMillis(0));
        b.evaluate(TrafficState::PedestriansPass, MonotonicMillis(0));

        assert!(!a
            .evaluate(TrafficState::CarsWarning, MonotonicMillis(16000))
            .is_fatal());
        assert!(!b
            .evaluate(TrafficState::PedestriansWarning, MonotonicMillis(8000))
            .is_fatal());
    }
}
