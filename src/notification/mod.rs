//! Parsing of the device's state-change notifications.
//!
//! The controller prints `Switching to state N` each time it changes state,
//! interleaved with unrelated chatter. Only the prefixed lines matter.

pub mod error;

pub use error::NotificationError;

use crate::core::TrafficState;

/// Literal prefix of a state-change notification.
pub const NOTIFICATION_PREFIX: &str = "Switching to state ";

/// Parse one decoded line.
///
/// Returns `Ok(None)` for lines that are not notifications,
/// `Ok(Some(state))` for a well-formed notification, and an error when the
/// prefix is present but the payload is not an ordinal in `0..=3`.
///
/// Surrounding whitespace (including a stray `\r`) is ignored.
///
/// # Example
///
/// ```rust
/// use trafficcheck::core::TrafficState;
/// use trafficcheck::notification::parse_line;
///
/// assert_eq!(parse_line("Switching to state 3"), Ok(Some(TrafficState::CarsPass)));
/// assert_eq!(parse_line("Current state is red"), Ok(None));
/// assert!(parse_line("Switching to state 9").is_err());
/// ```
pub fn parse_line(line: &str) -> Result<Option<TrafficState>, NotificationError> {
    let Some(payload) = line.trim_start().strip_prefix(NOTIFICATION_PREFIX) else {
        return Ok(None);
    };
    let line = line.trim();

    let payload = payload.trim();
    let digits = payload.strip_prefix(['+', '-']).unwrap_or(payload);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NotificationError::NotAnInteger {
            line: line.to_string(),
            payload: payload.to_string(),
        });
    }

    // Too large for i64 is still an integer, just not an ordinal.
    payload
        .parse::<i64>()
        .ok()
        .and_then(|ordinal| u8::try_from(ordinal).ok())
        .and_then(TrafficState::from_ordinal)
        .map(Some)
        .ok_or_else(|| NotificationError::UnknownOrdinal {
            line: line.to_string(),
            payload: payload.to_string(),
        })
}
