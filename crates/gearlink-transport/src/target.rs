use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Baud rate used by the sensor node firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Where a telemetry link lives.
///
/// Parsed from a short string:
/// - `-` selects standard input/output
/// - `unix:PATH` selects a Unix domain socket
/// - anything else is taken as a serial device (`/dev/ttyACM0`, `COM4`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Stdio,
    Unix(PathBuf),
    Serial(String),
}

impl FromStr for LinkTarget {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TransportError::InvalidTarget(s.to_string()));
        }
        if s == "-" {
            return Ok(Self::Stdio);
        }
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(TransportError::InvalidTarget(s.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        Ok(Self::Serial(s.to_string()))
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::Stdio => write!(f, "-"),
            LinkTarget::Unix(path) => write!(f, "unix:{}", path.display()),
            LinkTarget::Serial(path) => write!(f, "{path}"),
        }
    }
}

/// Link parameters.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Serial baud rate. Ignored for non-serial links. Default: 115200.
    pub baud_rate: u32,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl LinkTarget {
    /// Open the link as a client (blocking).
    ///
    /// Serial ports are opened 8N1 without flow control, matching the node
    /// firmware. Unix targets connect to an already listening socket.
    pub fn connect(&self, config: &LinkConfig) -> Result<LinkStream> {
        let mut stream = match self {
            LinkTarget::Stdio => LinkStream::stdio(),
            LinkTarget::Serial(path) => open_serial(path, config.baud_rate)?,
            #[cfg(unix)]
            LinkTarget::Unix(path) => crate::uds::UnixLinkListener::connect(path)?,
            #[cfg(not(unix))]
            LinkTarget::Unix(_) => return Err(TransportError::Unsupported("unix")),
        };
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        info!(target = %self, kind = stream.kind(), "link opened");
        Ok(stream)
    }
}

fn open_serial(path: &str, baud_rate: u32) -> Result<LinkStream> {
    let port = serialport::new(path, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open()
        .map_err(|source| TransportError::SerialOpen {
            path: path.to_string(),
            source,
        })?;
    debug!(path, baud_rate, "serial port opened");
    Ok(LinkStream::from_serial(port))
}

/// List serial devices visible to the host.
pub fn available_serial_ports() -> Vec<String> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stdio_target() {
        assert_eq!("-".parse::<LinkTarget>().unwrap(), LinkTarget::Stdio);
    }

    #[test]
    fn parses_unix_target() {
        let target: LinkTarget = "unix:/tmp/node.sock".parse().unwrap();
        assert_eq!(target, LinkTarget::Unix(PathBuf::from("/tmp/node.sock")));
        assert_eq!(target.to_string(), "unix:/tmp/node.sock");
    }

    #[test]
    fn parses_serial_target() {
        let target: LinkTarget = "/dev/ttyACM0".parse().unwrap();
        assert_eq!(target, LinkTarget::Serial("/dev/ttyACM0".to_string()));

        let target: LinkTarget = "COM4".parse().unwrap();
        assert_eq!(target, LinkTarget::Serial("COM4".to_string()));
    }

    #[test]
    fn rejects_empty_targets() {
        assert!(matches!(
            "".parse::<LinkTarget>(),
            Err(TransportError::InvalidTarget(_))
        ));
        assert!(matches!(
            "unix:".parse::<LinkTarget>(),
            Err(TransportError::InvalidTarget(_))
        ));
    }

    #[test]
    fn default_config_matches_firmware() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert!(cfg.read_timeout.is_none());
    }

    #[test]
    fn opening_missing_serial_device_fails() {
        let target = LinkTarget::Serial("/dev/gearlink-does-not-exist".to_string());
        let err = target.connect(&LinkConfig::default()).unwrap_err();
        assert!(matches!(err, TransportError::SerialOpen { .. }));
    }
}
