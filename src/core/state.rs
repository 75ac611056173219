//! Traffic-light states and the transition table of the device under test.
//!
//! The state set is closed and the successor relation is an exhaustive
//! `match`, so adding a state fails to compile until every table covers it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State reported by the traffic-light controller.
///
/// The discriminants are the ordinals the device prints on the wire
/// (`Switching to state N`).
///
/// # Example
///
/// ```rust
/// use trafficcheck::core::TrafficState;
///
/// assert_eq!(TrafficState::from_ordinal(3), Some(TrafficState::CarsPass));
/// assert_eq!(TrafficState::CarsPass.successor(), TrafficState::CarsWarning);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TrafficState {
    /// Pedestrians can cross.
    PedestriansPass = 0,
    /// Pedestrians are told to clear the crossing.
    PedestriansWarning = 1,
    /// Cars are told to stop.
    CarsWarning = 2,
    /// Cars can pass.
    CarsPass = 3,
}

impl TrafficState {
    /// Every state, in ordinal order.
    pub const ALL: [TrafficState; 4] = [
        Self::PedestriansPass,
        Self::PedestriansWarning,
        Self::CarsWarning,
        Self::CarsPass,
    ];

    /// Get the state's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PedestriansPass => "PedestriansPass",
            Self::PedestriansWarning => "PedestriansWarning",
            Self::CarsWarning => "CarsWarning",
            Self::CarsPass => "CarsPass",
        }
    }

    /// Wire ordinal of this state.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Decode a wire ordinal. Returns `None` outside `0..=3`.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::PedestriansPass),
            1 => Some(Self::PedestriansWarning),
            2 => Some(Self::CarsWarning),
            3 => Some(Self::CarsPass),
            _ => None,
        }
    }

    /// The single legal successor of this state.
    ///
    /// The relation is the simple cycle
    /// `CarsPass -> CarsWarning -> PedestriansPass -> PedestriansWarning -> CarsPass`.
    pub fn successor(&self) -> Self {
        match self {
            Self::CarsPass => Self::CarsWarning,
            Self::CarsWarning => Self::PedestriansPass,
            Self::PedestriansPass => Self::PedestriansWarning,
            Self::PedestriansWarning => Self::CarsPass,
        }
    }

    /// Whether the device may leave this state before its timer expires.
    ///
    /// Only `CarsPass` can be cut short, by the pedestrian request button.
    pub fn allows_early_exit(&self) -> bool {
        matches!(self, Self::CarsPass)
    }
}

impl fmt::Display for TrafficState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
