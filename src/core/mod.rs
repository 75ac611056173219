//! Core model of the device under test.
//!
//! This module contains the pure part of the checker:
//! - The closed set of traffic-light states and their successor table
//! - Expected dwell times and the tolerance classifier
//! - Immutable history of observed transitions
//!
//! Nothing here performs I/O; the clock is injected through [`Clock`].

mod history;
mod state;
mod timing;

pub use history::{ObservedTransition, TransitionHistory};
pub use state::TrafficState;
pub use timing::{
    classify, timing_error, Clock, DelayTable, MonotonicClock, MonotonicMillis, TimingClass,
};
