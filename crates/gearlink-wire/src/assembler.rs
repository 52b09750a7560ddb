//! Incremental frame assembly over an append-only byte stream.
//!
//! The assembler owns the only buffer of not-yet-consumed bytes. Callers
//! append whatever the link delivered and drain decode events until the
//! assembler needs more input. Feeding the same bytes in one chunk or one
//! byte at a time produces the same event sequence.

use bytes::{Buf, BytesMut};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::codec::{split_frame, verify_frame, WireConfig, MAX_FRAME_SIZE};
use crate::error::DecodeFailure;
use crate::reading::SensorReading;
use crate::schema::SensorValue;

const INITIAL_BUFFER_CAPACITY: usize = 2 * MAX_FRAME_SIZE;

/// One decode event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Reading(SensorValue),
    Failure(DecodeFailure),
}

impl Decoded {
    pub fn reading(&self) -> Option<SensorReading> {
        match self {
            Decoded::Reading(value) => Some(value.reading()),
            Decoded::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DecodeFailure> {
        match self {
            Decoded::Reading(_) => None,
            Decoded::Failure(failure) => Some(failure),
        }
    }
}

/// Running counters over everything an assembler has seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssemblerStats {
    /// Structurally complete frames extracted.
    pub frames: u64,
    /// Frames that produced a reading.
    pub readings: u64,
    /// Bytes dropped while searching for a start marker.
    pub garbage_bytes: u64,
    pub checksum_failures: u64,
    pub width_mismatches: u64,
    /// Bytes dropped because the buffer cap was hit.
    pub overflow_bytes: u64,
}

/// Run one step of the framing state machine over `src`.
///
/// Returns `None` once `src` holds no complete frame; anything left is a
/// frame prefix waiting for more bytes.
pub(crate) fn decode_step(src: &mut BytesMut, stats: &mut AssemblerStats) -> Option<Decoded> {
    let scan = split_frame(src);
    if scan.skipped > 0 {
        stats.garbage_bytes += scan.skipped as u64;
        debug!(skipped = scan.skipped, "dropped bytes before start marker");
    }

    let frame = scan.frame?;
    stats.frames += 1;

    let decoded = match verify_frame(frame).and_then(|raw| raw.decode()) {
        Ok(value) => {
            stats.readings += 1;
            trace!(kind = %value.kind(), "decoded reading");
            Decoded::Reading(value)
        }
        Err(failure) => {
            match failure {
                DecodeFailure::ChecksumMismatch { .. } => stats.checksum_failures += 1,
                DecodeFailure::WidthMismatch { .. } => stats.width_mismatches += 1,
                DecodeFailure::Overflow { .. } => {}
            }
            warn!(%failure, "dropped frame");
            Decoded::Failure(failure)
        }
    };
    Some(decoded)
}

/// Turns arbitrarily chunked link bytes into decode events.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    max_buffered: usize,
    pending_overflow: usize,
    stats: AssemblerStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an assembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(&WireConfig::default())
    }

    /// Create an assembler with explicit configuration.
    pub fn with_config(config: &WireConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_buffered: config.max_buffered.max(MAX_FRAME_SIZE),
            pending_overflow: 0,
            stats: AssemblerStats::default(),
        }
    }

    /// Append bytes delivered by the link.
    ///
    /// This is the raw append: it does not decode. Appending past the cap
    /// without draining drops the oldest bytes, and the next
    /// [`decode_next`](Self::decode_next) reports
    /// [`DecodeFailure::Overflow`]. Use [`feed`](Self::feed) for input of
    /// any size.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);

        let excess = self.buf.len().saturating_sub(self.max_buffered);
        if excess > 0 {
            self.buf.advance(excess);
            self.pending_overflow += excess;
            self.stats.overflow_bytes += excess as u64;
            warn!(dropped = excess, cap = self.max_buffered, "decoder buffer full");
        }
    }

    /// Bytes that can be appended before the cap is reached.
    ///
    /// After a drain this is never zero: what is left is shorter than one
    /// frame and the cap is at least one frame.
    pub fn room(&self) -> usize {
        self.max_buffered.saturating_sub(self.buf.len())
    }

    /// Produce the next decode event, or `None` if more bytes are needed.
    pub fn decode_next(&mut self) -> Option<Decoded> {
        if self.pending_overflow > 0 {
            let dropped = std::mem::take(&mut self.pending_overflow);
            return Some(Decoded::Failure(DecodeFailure::Overflow { dropped }));
        }
        decode_step(&mut self.buf, &mut self.stats)
    }

    /// Iterate over every event the buffered bytes can produce right now.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain {
            assembler: self,
            input: &[],
        }
    }

    /// Iterate over the events produced by `chunk`.
    ///
    /// `chunk` is admitted in slices that fit the cap, each drained before
    /// the next, so a chunk of any length decodes exactly as if it had
    /// arrived one byte at a time. Dropping the iterator early appends the
    /// rest of `chunk` with [`extend`](Self::extend).
    pub fn feed<'a>(&'a mut self, chunk: &'a [u8]) -> Drain<'a> {
        Drain {
            assembler: self,
            input: chunk,
        }
    }

    /// Bytes currently held (at most one incomplete frame after a drain).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> &AssemblerStats {
        &self.stats
    }

    /// Drop any buffered partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pending_overflow = 0;
    }
}

/// Iterator returned by [`FrameAssembler::drain`].
#[derive(Debug)]
pub struct Drain<'a> {
    assembler: &'a mut FrameAssembler,
    input: &'a [u8],
}

impl Iterator for Drain<'_> {
    type Item = Decoded;

    fn next(&mut self) -> Option<Decoded> {
        loop {
            if let Some(event) = self.assembler.decode_next() {
                return Some(event);
            }
            if self.input.is_empty() {
                return None;
            }
            let take = self.input.len().min(self.assembler.room().max(1));
            let (head, rest) = self.input.split_at(take);
            self.assembler.extend(head);
            self.input = rest;
        }
    }
}

impl Drop for Drain<'_> {
    fn drop(&mut self) {
        // Stopping early keeps the unread input buffered.
        let rest = std::mem::take(&mut self.input);
        if !rest.is_empty() {
            self.assembler.extend(rest);
        }
    }
}
