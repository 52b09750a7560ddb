//! Resynchronizing sensor frame codec for gearbox test-bench telemetry.
//!
//! Every reading travels as one self-delimiting frame:
//! - A 1-byte start marker (`0xAA`)
//! - A 1-byte sensor tag
//! - A 1-byte payload length
//! - The payload, little-endian
//! - A 1-byte XOR of every preceding frame byte
//!
//! The link carries no other delimiters, so a receiver can join at any byte
//! offset and still lock onto the next frame. Corrupt frames are reported as
//! diagnostics and skipped; they never stop the stream.

pub mod assembler;
#[cfg(feature = "async")]
pub mod async_codec;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
pub mod reading;
pub mod schema;
pub mod writer;

pub use assembler::{AssemblerStats, Decoded, Drain, FrameAssembler};
#[cfg(feature = "async")]
pub use async_codec::TelemetryCodec;
pub use checksum::{xor_checksum, XorChecksum};
pub use codec::{
    encode_frame, encode_value, RawFrame, WireConfig, DEFAULT_MAX_BUFFERED, HEADER_SIZE,
    MAX_FRAME_SIZE, MAX_PAYLOAD, MIN_FRAME_SIZE, START_MARKER,
};
pub use error::{DecodeFailure, Result, WireError};
pub use reader::ReadingReader;
pub use reading::{ReadingValue, SensorReading};
pub use schema::{ParseValueError, PayloadCodec, SensorKind, SensorValue, WireScalar};
pub use writer::ReadingWriter;
