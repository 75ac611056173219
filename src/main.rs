//! Traffic-light conformance checker CLI
//!
//! Watches a traffic-light controller over its serial link and fails on the
//! first illegal transition or out-of-tolerance dwell time.
//!
//! # Example
//!
//! ```bash
//! # Watch the device at 115200 baud for five minutes
//! trafficcheck --port /dev/ttyACM0 --baud 115200 --duration 300
//!
//! # Use a config file and tighten the tolerance
//! trafficcheck --config device.json --tolerance 5
//!
//! # Check a capture of earlier device output instead of a live port
//! trafficcheck --replay session.log --duration 60
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trafficcheck::config::{CheckConfig, ConfigError};
use trafficcheck::core::MonotonicClock;
use trafficcheck::runner::RunController;
use trafficcheck::source::{LineSource, ReaderSource, SourceError};

/// Traffic-light conformance checker
///
/// Validates the state sequence and dwell times reported by a traffic-light
/// controller. Exits with status 0 if the run duration elapses without a
/// violation.
#[derive(Parser, Debug)]
#[command(name = "trafficcheck")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON config file; flags override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Serial device the controller is attached to
    #[arg(short = 'p', long)]
    port: Option<String>,

    /// Baud rate applied to the serial port when it is opened
    #[arg(short = 'b', long)]
    baud: Option<u32>,

    /// Read device output from a capture file instead of the serial port
    #[arg(short = 'r', long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// Time for the pedestrians to pass, in milliseconds
    #[arg(long)]
    pedestrians_ms: Option<u64>,

    /// Time spent in either warning state, in milliseconds
    #[arg(long)]
    warning_ms: Option<u64>,

    /// Time for the cars to pass, in milliseconds
    #[arg(long)]
    cars_ms: Option<u64>,

    /// Maximum absolute dwell-time error, in milliseconds
    #[arg(short = 't', long)]
    tolerance: Option<u64>,

    /// Run duration in seconds
    #[arg(short = 'd', long)]
    duration: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<CheckConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => CheckConfig::load(path)?,
            None => CheckConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(ms) = self.pedestrians_ms {
            config.pedestrians_delay_ms = ms;
        }
        if let Some(ms) = self.warning_ms {
            config.warning_delay_ms = ms;
        }
        if let Some(ms) = self.cars_ms {
            config.cars_delay_ms = ms;
        }
        if let Some(ms) = self.tolerance {
            config.tolerance_ms = ms;
        }
        if let Some(secs) = self.duration {
            config.duration_secs = secs;
        }

        config.validated()
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,trafficcheck=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let replay = args.replay.clone();
    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    match replay {
        Some(path) => {
            info!(
                path = %path.display(),
                tolerance_ms = config.tolerance_ms,
                duration_secs = config.duration_secs,
                "Replaying capture"
            );
            with_source(ReaderSource::open_capture(&path), &config)
        }
        None => {
            info!(
                port = %config.port,
                baud_rate = config.baud_rate,
                tolerance_ms = config.tolerance_ms,
                duration_secs = config.duration_secs,
                "Opening device"
            );
            with_source(ReaderSource::open_serial(&config.port_settings()), &config)
        }
    }
}

fn with_source<S: LineSource>(
    opened: Result<S, SourceError>,
    config: &CheckConfig,
) -> ExitCode {
    match opened {
        Ok(source) => execute(source, config),
        Err(err) => {
            error!(%err, "Cannot open device");
            ExitCode::from(2)
        }
    }
}

fn execute<S: LineSource>(source: S, config: &CheckConfig) -> ExitCode {
    let controller = RunController::from_config(source, MonotonicClock::new(), config);
    match controller.run(|diagnostic| println!("{diagnostic}")) {
        Ok(report) => {
            println!("{report}");
            if report.outcome.is_pass() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!(%err, "Run aborted");
            println!("Test failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trafficcheck::source::PortSettings;

    fn temp_config(json: &str) -> PathBuf {
        let name = format!("trafficcheck-{}.json", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn defaults_without_flags() {
        let args = Args::try_parse_from(["trafficcheck"]).unwrap();
        assert_eq!(args.into_config().unwrap(), CheckConfig::default());
    }

    #[test]
    fn flags_override_the_config_file() {
        let path = temp_config(
            r#"{ "port": "/dev/ttyUSB0", "tolerance_ms": 20, "cars_delay_ms": 12000 }"#,
        );

        let args = Args::try_parse_from([
            "trafficcheck",
            "--config",
            path.to_str().unwrap(),
            "--tolerance",
            "5",
            "--port",
            "/dev/ttyACM1",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.port, "/dev/ttyACM1");
        assert_eq!(config.tolerance_ms, 5);
        // Untouched by flags, so the file wins over the default.
        assert_eq!(config.cars_delay_ms, 12000);
        assert_eq!(config.warning_delay_ms, 4000);
    }

    #[test]
    fn baud_flag_reaches_the_port_settings() {
        let args =
            Args::try_parse_from(["trafficcheck", "-p", "/dev/ttyS3", "-b", "115200"]).unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(
            config.port_settings(),
            PortSettings::new("/dev/ttyS3", 115_200)
        );
    }

    #[test]
    fn overrides_are_validated() {
        let args =
            Args::try_parse_from(["trafficcheck", "--duration", "0", "--baud", "0"]).unwrap();

        let result = args.into_config();

        assert_eq!(
            result,
            Err(ConfigError::Invalid(vec![
                ConfigError::ZeroBaudRate,
                ConfigError::ZeroDuration
            ]))
        );
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = Args::try_parse_from(["trafficcheck", "--config", "/nonexistent/device.json"])
            .unwrap();
        assert!(matches!(args.into_config(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn replay_path_is_parsed() {
        let args = Args::try_parse_from(["trafficcheck", "--replay", "session.log"]).unwrap();
        assert_eq!(args.replay, Some(PathBuf::from("session.log")));
    }
}
