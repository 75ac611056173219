//! Run configuration.
//!
//! The expected delays must mirror the firmware of the device under test,
//! otherwise every run fails on timing. Defaults match the reference
//! firmware.
//!
//! Validation uses Stillwater's `Validation` so that every problem is
//! reported at once instead of one per attempt.
//!
//! # Example
//!
//! ```rust
//! use trafficcheck::config::CheckConfig;
//!
//! let config = CheckConfig::from_json_str(r#"{ "port": "/dev/ttyACM0", "tolerance_ms": 20 }"#)
//!     .unwrap();
//! assert_eq!(config.tolerance_ms, 20);
//! assert_eq!(config.cars_delay_ms, 16000);
//! ```

pub mod error;

pub use error::ConfigError;

use crate::core::DelayTable;
use crate::source::PortSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_PEDESTRIANS_DELAY_MS: u64 = 8000;
pub const DEFAULT_WARNING_DELAY_MS: u64 = 4000;
pub const DEFAULT_CARS_DELAY_MS: u64 = 16000;
pub const DEFAULT_TOLERANCE_MS: u64 = 10;
pub const DEFAULT_DURATION_SECS: u64 = 300;

/// Everything a run needs to know.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Serial device the controller is attached to
    pub port: String,
    /// Line speed of the serial link
    pub baud_rate: u32,
    /// Time for the pedestrians to pass
    pub pedestrians_delay_ms: u64,
    /// Time spent in either warning state
    pub warning_delay_ms: u64,
    /// Time for the cars to pass
    pub cars_delay_ms: u64,
    /// Maximum absolute dwell-time error
    pub tolerance_ms: u64,
    /// How long to watch the device
    pub duration_secs: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            pedestrians_delay_ms: DEFAULT_PEDESTRIANS_DELAY_MS,
            warning_delay_ms: DEFAULT_WARNING_DELAY_MS,
            cars_delay_ms: DEFAULT_CARS_DELAY_MS,
            tolerance_ms: DEFAULT_TOLERANCE_MS,
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl CheckConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&contents)
    }

    /// Expected dwell times derived from the three firmware timers.
    pub fn delays(&self) -> DelayTable {
        DelayTable::from_device_delays(
            self.pedestrians_delay_ms,
            self.warning_delay_ms,
            self.cars_delay_ms,
        )
    }

    /// Serial link settings for opening the device.
    pub fn port_settings(&self) -> PortSettings {
        PortSettings::new(self.port.as_str(), self.baud_rate)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Check every field, accumulating ALL problems.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let checks = vec![
            check(!self.port.trim().is_empty(), ConfigError::EmptyPort),
            check(self.baud_rate > 0, ConfigError::ZeroBaudRate),
            check(self.duration_secs > 0, ConfigError::ZeroDuration),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// Consume the config if it is valid.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(()) => Ok(self),
            Validation::Failure(errors) => Err(ConfigError::Invalid(errors.iter().cloned().collect())),
        }
    }
}

fn check(ok: bool, error: ConfigError) -> Validation<(), NonEmptyVec<ConfigError>> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error)
    }
}
