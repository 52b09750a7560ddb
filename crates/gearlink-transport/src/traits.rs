use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// Read timeout applied to serial ports when the caller asks for none.
///
/// The serial driver always needs a finite timeout; an hour behaves as
/// blocking for telemetry purposes.
const SERIAL_BLOCKING_TIMEOUT: Duration = Duration::from_secs(3600);

/// A connected telemetry link. Implements Read + Write.
///
/// The link carries raw bytes only. Frame boundaries are recovered by the
/// wire layer, so reads may return any number of bytes including fragments
/// of a frame or several frames at once.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    Serial(Box<dyn serialport::SerialPort>),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Stdio {
        stdin: std::io::Stdin,
        stdout: std::io::Stdout,
    },
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port.read(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
            LinkStreamInner::Stdio { stdin, .. } => stdin.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port.write(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
            LinkStreamInner::Stdio { stdout, .. } => stdout.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port.flush(),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
            LinkStreamInner::Stdio { stdout, .. } => stdout.flush(),
        }
    }
}

impl LinkStream {
    /// Create a LinkStream from an opened serial port.
    pub(crate) fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner: LinkStreamInner::Serial(port),
        }
    }

    /// Create a LinkStream from a Unix domain socket stream.
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Create a LinkStream over the process's standard input and output.
    pub fn stdio() -> Self {
        Self {
            inner: LinkStreamInner::Stdio {
                stdin: std::io::stdin(),
                stdout: std::io::stdout(),
            },
        }
    }

    /// Set read timeout on the underlying link.
    ///
    /// Standard input has no timeout support; the call is a no-op there.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port
                .set_timeout(timeout.unwrap_or(SERIAL_BLOCKING_TIMEOUT))
                .map_err(|err| TransportError::Io(err.into())),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Stdio { .. } => Ok(()),
        }
    }

    /// Set write timeout on the underlying link.
    ///
    /// Serial ports share one timeout for both directions, so only Unix
    /// sockets honor this.
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(_) => Ok(()),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            LinkStreamInner::Stdio { .. } => Ok(()),
        }
    }

    /// Short name of the link kind for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            LinkStreamInner::Serial(_) => "serial",
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => "unix",
            LinkStreamInner::Stdio { .. } => "stdio",
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("type", &self.kind())
            .finish()
    }
}
