//! Run controller: the imperative shell around the validator.
//!
//! Pulls lines from a [`LineSource`] until the run duration has elapsed on
//! the injected [`Clock`], or until the first fatal violation.

mod report;

pub use report::{Diagnostic, RunError, RunOutcome, RunReport};

use crate::config::CheckConfig;
use crate::core::{Clock, MonotonicMillis};
use crate::notification::parse_line;
use crate::source::LineSource;
use crate::validator::{Validator, Verdict};
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, info_span, trace, warn};
use uuid::Uuid;

/// Drives one conformance run.
#[derive(Debug)]
pub struct RunController<S, C> {
    source: S,
    clock: C,
    validator: Validator,
    duration_ms: u64,
    run_id: Uuid,
}

impl<S: LineSource, C: Clock> RunController<S, C> {
    pub fn new(source: S, clock: C, validator: Validator, duration: Duration) -> Self {
        Self {
            source,
            clock,
            validator,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            run_id: Uuid::new_v4(),
        }
    }

    /// Controller for the delays, tolerance and duration of `config`.
    pub fn from_config(source: S, clock: C, config: &CheckConfig) -> Self {
        let validator = Validator::new(config.delays(), config.tolerance_ms);
        Self::new(source, clock, validator, config.duration())
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run to completion, handing every diagnostic to `on_diagnostic` as it
    /// occurs.
    ///
    /// The duration is checked once per line, after the line is processed;
    /// a blocked read is never interrupted.
    pub fn run<F>(mut self, mut on_diagnostic: F) -> Result<RunReport, RunError>
    where
        F: FnMut(&Diagnostic),
    {
        let span = info_span!("run", run_id = %self.run_id);
        let _enter = span.enter();

        let start = self.clock.now();
        let started_at = Utc::now();
        let mut report = RunReport {
            run_id: self.run_id,
            outcome: RunOutcome::Passed,
            started_at,
            finished_at: started_at,
            accepted: 0,
            warnings: 0,
            malformed: 0,
            ignored: 0,
            history: Default::default(),
        };

        info!(
            duration_ms = self.duration_ms,
            tolerance_ms = self.validator.tolerance_ms(),
            "Starting conformance run"
        );

        while self.clock.now().saturating_since(start) < self.duration_ms {
            let Some(line) = self.source.next_line()? else {
                let elapsed_ms = self.clock.now().saturating_since(start);
                error!(elapsed_ms, "Line source closed early");
                return Err(RunError::SourceClosed { elapsed_ms });
            };

            let state = match parse_line(&line) {
                Ok(Some(state)) => state,
                Ok(None) => {
                    trace!(%line, "Ignoring device chatter");
                    report.ignored += 1;
                    continue;
                }
                Err(err) => {
                    warn!(%err, "Skipping malformed notification");
                    report.malformed += 1;
                    on_diagnostic(&Diagnostic::Malformed(err));
                    continue;
                }
            };

            let at = self.clock.now();
            let verdict = self.validator.evaluate(state, at);
            log_verdict(&verdict, at);
            on_diagnostic(&Diagnostic::Verdict(verdict.clone()));

            match verdict {
                Verdict::Accepted(_) => report.accepted += 1,
                Verdict::Warning(_) => report.warnings += 1,
                Verdict::FatalViolation(violation) => {
                    report.outcome = RunOutcome::Failed(violation);
                    break;
                }
            }
        }

        report.history = self.validator.history().clone();
        report.finished_at = Utc::now();
        if report.outcome.is_pass() {
            info!(
                transitions = report.history.len(),
                warnings = report.warnings,
                max_abs_error_ms = report.history.max_abs_error(),
                observed_ms = report
                    .history
                    .duration()
                    .and_then(|d| u64::try_from(d.as_millis()).ok()),
                "Run passed"
            );
        }
        Ok(report)
    }
}

fn log_verdict(verdict: &Verdict, at: MonotonicMillis) {
    match verdict {
        Verdict::Accepted(note) => info!(at = at.0, "{note}"),
        Verdict::Warning(early) => warn!(
            at = at.0,
            from = %early.from,
            to = %early.to,
            error_ms = early.error_ms,
            tolerance_ms = early.tolerance_ms,
            "Early exit"
        ),
        Verdict::FatalViolation(violation) => error!(at = at.0, %violation, "Run failed"),
    }
}
