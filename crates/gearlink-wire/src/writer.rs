use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use gearlink_transport::LinkStream;

use crate::codec::{encode_frame, encode_value, WireConfig, MAX_FRAME_SIZE};
use crate::error::{Result, WireError};
use crate::schema::SensorValue;

/// Writes complete sensor frames to any `Write` stream.
///
/// This is the node side of the link: one call, one frame, flushed.
pub struct ReadingWriter<T> {
    inner: T,
    buf: BytesMut,
    config: WireConfig,
}

impl<T: Write> ReadingWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            config,
        }
    }

    /// Encode and send one typed value.
    pub fn send(&mut self, value: &SensorValue) -> Result<()> {
        self.buf.clear();
        encode_value(value, &mut self.buf)?;
        self.write_buffered()
    }

    /// Encode and send an arbitrary tag and payload.
    ///
    /// Used to exercise receivers with tags they have no codec for.
    pub fn send_raw(&mut self, tag: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(tag, payload, &mut self.buf)?;
        self.write_buffered()
    }

    /// Write bytes exactly as given, without framing.
    ///
    /// Lets simulators inject line noise between frames.
    pub fn send_noise(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}

impl ReadingWriter<LinkStream> {
    /// Create a writer for a `LinkStream` and apply the write timeout from config.
    pub fn with_config_link(mut inner: LinkStream, config: WireConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
