use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::{xor_checksum, XorChecksum};
use crate::error::{DecodeFailure, Result, WireError};
use crate::schema::{SensorKind, SensorValue};

/// Resynchronization byte at the start of every frame.
pub const START_MARKER: u8 = 0xAA;

/// Frame header: start (1) + type (1) + length (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Trailing XOR byte.
pub const CHECKSUM_SIZE: usize = 1;

/// Smallest possible frame: header plus checksum, empty payload.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Largest possible frame on the wire.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD + CHECKSUM_SIZE;

/// Default cap on bytes held by a decoder that is fed faster than drained.
pub const DEFAULT_MAX_BUFFERED: usize = 64 * 1024;

/// Total wire size of a frame whose length byte is `declared_len`.
pub const fn frame_size(declared_len: u8) -> usize {
    HEADER_SIZE + declared_len as usize + CHECKSUM_SIZE
}

/// A checksum-verified frame that has not been run through a payload codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// The sensor type byte.
    pub tag: u8,
    /// The payload bytes.
    pub payload: Bytes,
}

impl RawFrame {
    /// Create a new frame.
    pub fn new(tag: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    pub fn kind(&self) -> SensorKind {
        SensorKind::from_tag(self.tag)
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }

    /// Run the payload through the codec for this frame's tag.
    pub fn decode(self) -> std::result::Result<SensorValue, DecodeFailure> {
        SensorValue::decode(self.kind(), self.payload)
    }
}

/// Encode a tagged payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────┬────────┬────────┬──────────────────┬──────────┐
/// │ Start  │ Type   │ Length │ Payload          │ Checksum │
/// │ 0xAA   │ (1B)   │ (1B)   │ (Length bytes)   │ XOR (1B) │
/// └────────┴────────┴────────┴──────────────────┴──────────┘
/// ```
///
/// The checksum covers the bytes exactly as written, start marker included.
pub fn encode_frame(tag: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u8::try_from(payload.len()).map_err(|_| WireError::PayloadTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD,
    })?;

    let start = dst.len();
    dst.reserve(frame_size(len));
    dst.put_u8(START_MARKER);
    dst.put_u8(tag);
    dst.put_u8(len);
    dst.put_slice(payload);

    let mut checksum = XorChecksum::new();
    checksum.update(&dst[start..]);
    dst.put_u8(checksum.value());
    Ok(())
}

/// Encode a typed sensor value into the wire format.
///
/// Known kinds always fit; only an oversized [`SensorValue::Unrecognized`]
/// payload can fail.
pub fn encode_value(value: &SensorValue, dst: &mut BytesMut) -> Result<()> {
    let mut payload = BytesMut::with_capacity(value.payload_len());
    value.write_payload(&mut payload);
    encode_frame(value.kind().tag(), &payload, dst)
}

/// Outcome of one framing pass over buffered bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scan {
    /// Garbage bytes dropped from the front of the buffer.
    pub skipped: usize,
    /// A complete frame (start marker through checksum), not yet verified.
    pub frame: Option<Bytes>,
}

/// Locate and split off the next complete frame from `src`.
///
/// Bytes before the first start marker are discarded. If no marker is
/// present at all the whole buffer is discarded. A frame is only removed
/// once every byte its length field promises has arrived; until then `src`
/// keeps the partial frame untouched and `frame` is `None`.
pub fn split_frame(src: &mut BytesMut) -> Scan {
    let mut scan = Scan::default();

    if src.len() < MIN_FRAME_SIZE {
        return scan; // Need more data
    }

    match src.iter().position(|&b| b == START_MARKER) {
        Some(0) => {}
        Some(offset) => {
            src.advance(offset);
            scan.skipped = offset;
        }
        None => {
            scan.skipped = src.len();
            src.clear();
            return scan;
        }
    }

    if src.len() < HEADER_SIZE {
        return scan; // Need more data
    }

    let total = frame_size(src[2]);
    if src.len() < total {
        return scan; // Need more data
    }

    scan.frame = Some(src.split_to(total).freeze());
    scan
}

/// Verify the checksum of a complete frame produced by [`split_frame`].
///
/// A frame must be at least [`MIN_FRAME_SIZE`] bytes; `split_frame` never
/// produces anything shorter.
pub fn verify_frame(frame: Bytes) -> std::result::Result<RawFrame, DecodeFailure> {
    debug_assert!(frame.len() >= MIN_FRAME_SIZE);

    let body_len = frame.len() - CHECKSUM_SIZE;
    let expected = xor_checksum(&frame[..body_len]);
    let received = frame[body_len];
    if expected != received {
        return Err(DecodeFailure::ChecksumMismatch {
            tag: frame[1],
            declared_len: frame[2],
            frame_len: frame.len(),
            expected,
            received,
        });
    }

    Ok(RawFrame {
        tag: frame[1],
        payload: frame.slice(HEADER_SIZE..body_len),
    })
}

/// Decoder, reader and writer settings.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Maximum bytes the decoder holds before dropping the oldest.
    /// Default: 64 KiB. Never below [`MAX_FRAME_SIZE`].
    pub max_buffered: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_buffered: DEFAULT_MAX_BUFFERED,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
