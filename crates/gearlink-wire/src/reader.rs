use std::io::{ErrorKind, Read};

use gearlink_transport::LinkStream;
use tracing::debug;

use crate::assembler::{AssemblerStats, Decoded, FrameAssembler};
use crate::codec::WireConfig;
use crate::error::{Result, WireError};
use crate::schema::SensorValue;

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads decode events from any `Read` byte stream.
///
/// Partial reads, garbage and bursts are absorbed by the inner
/// [`FrameAssembler`]; callers only ever see whole readings or diagnostics.
pub struct ReadingReader<T> {
    inner: T,
    assembler: FrameAssembler,
    config: WireConfig,
}

impl<T: Read> ReadingReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            assembler: FrameAssembler::with_config(&config),
            config,
        }
    }

    /// Read the next decode event (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` at end of stream. Bytes of
    /// an unfinished frame stay buffered.
    pub fn read_event(&mut self) -> Result<Decoded> {
        loop {
            if let Some(event) = self.assembler.decode_next() {
                return Ok(event);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let want = READ_CHUNK_SIZE.min(self.assembler.room().max(1));
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                if self.assembler.buffered() > 0 {
                    debug!(
                        buffered = self.assembler.buffered(),
                        "link closed with partial frame buffered"
                    );
                }
                return Err(WireError::ConnectionClosed);
            }

            self.assembler.extend(&chunk[..read]);
        }
    }

    /// Read the next successfully decoded value, skipping diagnostics.
    pub fn read_value(&mut self) -> Result<SensorValue> {
        loop {
            if let Decoded::Reading(value) = self.read_event()? {
                return Ok(value);
            }
        }
    }

    /// Swap in a fresh stream after a reconnect.
    ///
    /// Buffered bytes and statistics carry over, so a frame split across the
    /// outage still decodes if the sender resumes mid-frame. Returns the old
    /// stream.
    pub fn replace_inner(&mut self, inner: T) -> T {
        std::mem::replace(&mut self.inner, inner)
    }

    /// Counters from the inner assembler.
    pub fn stats(&self) -> &AssemblerStats {
        self.assembler.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}

impl ReadingReader<LinkStream> {
    /// Create a reader for a `LinkStream` and apply the read timeout from config.
    pub fn with_config_link(mut inner: LinkStream, config: WireConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
