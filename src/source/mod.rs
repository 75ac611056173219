//! Line sources: where device notifications come from.
//!
//! The checker only needs a blocking stream of decoded lines.
//! [`ReaderSource`] wraps any [`BufRead`]: a serial port opened with its
//! line settings applied, or a capture file replayed from disk.

use serialport::SerialPort;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Read timeout of a serial port. Timed-out reads are retried, so this only
/// bounds how long a single read call blocks.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors raised while opening or reading from a line source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open serial port {port} at {baud_rate} baud: {source}")]
    Serial {
        port: String,
        baud_rate: u32,
        #[source]
        source: serialport::Error,
    },

    #[error("Failed to read line: {0}")]
    Read(#[from] std::io::Error),
}

/// How to open the serial link to the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortSettings {
    pub path: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl PortSettings {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Port builder with every setting applied.
    pub fn builder(&self) -> serialport::SerialPortBuilder {
        serialport::new(self.path.as_str(), self.baud_rate).timeout(self.timeout)
    }
}

/// Blocking producer of decoded text lines.
pub trait LineSource {
    /// Next line with its terminator removed.
    ///
    /// Returns `Ok(None)` once the stream is closed.
    fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

/// Line source over any buffered reader.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so
/// line noise shows up as chatter instead of aborting the run. Reads that
/// time out are retried without losing the partial line.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use trafficcheck::source::{LineSource, ReaderSource};
///
/// let mut source = ReaderSource::new(Cursor::new("Switching to state 3\r\nboot\n"));
/// assert_eq!(source.next_line().unwrap().as_deref(), Some("Switching to state 3"));
/// assert_eq!(source.next_line().unwrap().as_deref(), Some("boot"));
/// assert_eq!(source.next_line().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

/// Line source reading from a serial port.
pub type SerialSource = ReaderSource<BufReader<Box<dyn SerialPort>>>;

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl ReaderSource<BufReader<Box<dyn SerialPort>>> {
    /// Open the serial port described by `settings`.
    pub fn open_serial(settings: &PortSettings) -> Result<Self, SourceError> {
        let port = settings
            .builder()
            .open()
            .map_err(|source| SourceError::Serial {
                port: settings.path.clone(),
                baud_rate: settings.baud_rate,
                source,
            })?;
        debug!(
            port = %settings.path,
            baud_rate = settings.baud_rate,
            "Opened serial port"
        );
        Ok(Self::new(BufReader::new(port)))
    }
}

impl ReaderSource<BufReader<File>> {
    /// Open a capture of device output for replay.
    pub fn open_capture(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            port: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Opened capture file");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        self.buf.clear();
        loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) if self.buf.is_empty() => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    trace!("Read timed out, waiting for more data");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        (**self).next_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Cursor, Read};

    /// Reader that times out between scripted chunks.
    struct Stuttering {
        chunks: VecDeque<Option<&'static [u8]>>,
    }

    impl Read for Stuttering {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(None) => Err(ErrorKind::TimedOut.into()),
                Some(Some(chunk)) => {
                    out[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
            }
        }
    }

    #[test]
    fn strips_terminators() {
        let mut source = ReaderSource::new(Cursor::new("a\r\nb\nc"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn keeps_empty_lines() {
        let mut source = ReaderSource::new(Cursor::new("\n\nx\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(source.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn decodes_invalid_utf8_lossily() {
        let bytes: &[u8] = b"Switching \xff state\n";
        let mut source = ReaderSource::new(Cursor::new(bytes));
        let line = source.next_line().unwrap().unwrap();
        assert!(line.starts_with("Switching "));
        assert!(line.contains('\u{FFFD}'));
    }

    #[test]
    fn timed_out_reads_keep_the_partial_line() {
        let reader = Stuttering {
            chunks: VecDeque::from(vec![
                None,
                Some(&b"Switching to "[..]),
                None,
                None,
                Some(&b"state 2\r\n"[..]),
            ]),
        };
        let mut source = ReaderSource::new(BufReader::new(reader));

        assert_eq!(
            source.next_line().unwrap().as_deref(),
            Some("Switching to state 2")
        );
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn other_read_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(ErrorKind::BrokenPipe.into())
            }
        }

        let mut source = ReaderSource::new(BufReader::new(Broken));
        assert!(matches!(source.next_line(), Err(SourceError::Read(_))));
    }

    #[test]
    fn port_settings_reach_the_error() {
        let settings = PortSettings::new("/nonexistent/ttyACM9", 115_200);

        let Err(err) = ReaderSource::open_serial(&settings) else {
            panic!("Expected opening a missing port to fail");
        };

        match err {
            SourceError::Serial {
                port, baud_rate, ..
            } => {
                assert_eq!(port, "/nonexistent/ttyACM9");
                assert_eq!(baud_rate, 115_200);
            }
            other => panic!("Expected serial open error, got {other:?}"),
        }
    }

    #[test]
    fn port_settings_default_timeout() {
        let settings = PortSettings::new("/dev/ttyACM0", 9600);
        assert_eq!(settings.timeout, DEFAULT_READ_TIMEOUT);
        assert_eq!(settings.baud_rate, 9600);
    }

    #[test]
    fn missing_capture_is_an_open_error() {
        let result = ReaderSource::open_capture("/nonexistent/capture.log");
        assert!(matches!(result, Err(SourceError::Open { .. })));
    }

    #[test]
    fn mutable_reference_is_a_source() {
        fn first(mut source: impl LineSource) -> Option<String> {
            source.next_line().unwrap()
        }

        let mut source = ReaderSource::new(Cursor::new("x\ny\n"));
        assert_eq!(first(&mut source).as_deref(), Some("x"));
        assert_eq!(first(&mut source).as_deref(), Some("y"));
    }
}
