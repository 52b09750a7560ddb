use serde::Serialize;

use crate::schema::SensorKind;

/// Errors that end a read or write on the telemetry stream.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload does not fit the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link reached end of stream.
    #[error("link closed")]
    ConnectionClosed,

    /// The link itself failed (open, configure, or a serial-port fault).
    #[error("link error: {0}")]
    Transport(#[from] gearlink_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, WireError>;

/// A structurally complete frame that produced no reading.
///
/// These are diagnostics, not stream errors: decoding always continues with
/// the bytes after the offending frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "failure", rename_all = "snake_case")]
pub enum DecodeFailure {
    /// The trailing XOR byte disagrees with the frame contents.
    #[error(
        "checksum mismatch for tag 0x{tag:02x} (length {declared_len}, {frame_len} frame bytes): \
         computed 0x{expected:02x}, received 0x{received:02x}"
    )]
    ChecksumMismatch {
        tag: u8,
        declared_len: u8,
        frame_len: usize,
        expected: u8,
        received: u8,
    },

    /// The payload length does not match the codec for a known sensor kind.
    /// Usually means the node and host disagree on the sensor table.
    #[error("{kind} payload is {actual} bytes, expected {expected}")]
    WidthMismatch {
        kind: SensorKind,
        expected: usize,
        actual: usize,
    },

    /// Bytes were discarded because the decoder buffer hit its cap.
    #[error("decoder buffer full, dropped {dropped} bytes")]
    Overflow { dropped: usize },
}

#[cfg(test)]
mod tests {
    use gearlink_transport::TransportError;

    use super::*;

    #[test]
    fn link_failures_keep_their_transport_error() {
        let err = WireError::from(TransportError::Unsupported("serial"));
        assert!(matches!(
            err,
            WireError::Transport(TransportError::Unsupported("serial"))
        ));
        assert_eq!(
            err.to_string(),
            "link error: serial links are not supported on this platform"
        );
    }
}
