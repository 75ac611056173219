//! Trafficcheck: hardware-in-the-loop conformance checking for a traffic-light
//! controller.
//!
//! The controller prints `Switching to state N` over its serial link each
//! time it changes state. Trafficcheck follows along and fails the run on the
//! first transition that breaks the state machine or misses its expected
//! dwell time by more than the tolerance.
//!
//! The crate follows a "pure core, imperative shell" layout:
//!
//! - [`core`]: states, the transition table, dwell-time classification
//! - [`notification`]: parsing of notification lines
//! - [`validator`]: per-notification verdicts over an explicit run state
//! - [`runner`]: the loop that reads lines, evaluates them and stops
//! - [`source`] and [`config`]: the I/O around it
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use std::time::Duration;
//! use trafficcheck::core::{DelayTable, MonotonicClock};
//! use trafficcheck::runner::RunController;
//! use trafficcheck::source::ReaderSource;
//! use trafficcheck::validator::Validator;
//!
//! let lines = "Switching to state 3\nSwitching to state 1\n";
//! let validator = Validator::new(DelayTable::from_device_delays(8000, 4000, 16000), 10);
//! let controller = RunController::new(
//!     ReaderSource::new(Cursor::new(lines)),
//!     MonotonicClock::new(),
//!     validator,
//!     Duration::from_secs(60),
//! );
//!
//! let report = controller.run(|diagnostic| println!("{diagnostic}")).unwrap();
//! assert!(!report.outcome.is_pass());
//! ```

pub mod config;
pub mod core;
pub mod notification;
pub mod runner;
pub mod source;
pub mod validator;

// Re-export commonly used types
pub use crate::core::{DelayTable, MonotonicMillis, TrafficState};
pub use runner::{RunController, RunOutcome, RunReport};
pub use validator::{Validator, Verdict, Violation};
