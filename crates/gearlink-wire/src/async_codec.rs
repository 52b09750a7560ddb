//! `tokio_util::codec` adapter for async hosts.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::assembler::{decode_step, AssemblerStats, Decoded};
use crate::codec::encode_value;
use crate::error::WireError;
use crate::schema::SensorValue;

/// Decodes telemetry frames from, and encodes values to, a framed async stream.
///
/// The decoder runs the same state machine as
/// [`FrameAssembler`](crate::FrameAssembler) directly on the framed buffer.
#[derive(Debug, Default)]
pub struct TelemetryCodec {
    stats: AssemblerStats,
}

impl TelemetryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &AssemblerStats {
        &self.stats
    }
}

impl Decoder for TelemetryCodec {
    type Item = Decoded;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Decoded>, WireError> {
        Ok(decode_step(src, &mut self.stats))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Decoded>, WireError> {
        if let Some(event) = decode_step(src, &mut self.stats) {
            return Ok(Some(event));
        }
        if !src.is_empty() {
            debug!(buffered = src.len(), "discarding partial frame at end of stream");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<SensorValue> for TelemetryCodec {
    type Error = WireError;

    fn encode(&mut self, item: SensorValue, dst: &mut BytesMut) -> Result<(), WireError> {
        encode_value(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::error::DecodeFailure;

    #[tokio::test]
    async fn framed_read_yields_readings() {
        let bytes: &[u8] = &[
            0x00, 0xAA, 0x10, 0x04, 0x00, 0x00, 0x70, 0x42, 0x8C, 0xAA, 0x20, 0x02, 0x20, 0x03,
            0xAB,
        ];
        let mut framed = FramedRead::new(bytes, TelemetryCodec::new());

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first, Decoded::Reading(SensorValue::OilTemperature(60.0)));
        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(second, Decoded::Reading(SensorValue::PrimaryAxleSpeed(800)));
        assert!(framed.next().await.is_none());

        let stats = framed.decoder().stats();
        assert_eq!(stats.readings, 2);
        assert_eq!(stats.garbage_bytes, 1);
    }

    #[tokio::test]
    async fn checksum_failure_is_an_item_not_an_error() {
        let bytes: &[u8] = &[
            0xAA, 0x20, 0x02, 0x20, 0x03, 0xAC, 0xAA, 0x21, 0x02, 0x20, 0x03, 0xAA,
        ];
        let mut framed = FramedRead::new(bytes, TelemetryCodec::new());

        let first = framed.next().await.unwrap().unwrap();
        assert!(matches!(
            first,
            Decoded::Failure(DecodeFailure::ChecksumMismatch { .. })
        ));
        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(
            second,
            Decoded::Reading(SensorValue::SecondaryAxleSpeed(800))
        );
    }

    #[tokio::test]
    async fn trailing_partial_frame_is_dropped_at_eof() {
        let bytes: &[u8] = &[0xAA, 0x20, 0x02, 0x20, 0x03, 0xAB, 0xAA, 0x10, 0x04, 0x00];
        let mut framed = FramedRead::new(bytes, TelemetryCodec::new());

        assert!(framed.next().await.unwrap().unwrap().reading().is_some());
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_write_encodes_values() {
        let mut framed = FramedWrite::new(Vec::new(), TelemetryCodec::new());
        framed
            .send(SensorValue::PrimaryAxleSpeed(800))
            .await
            .unwrap();

        assert_eq!(
            framed.get_ref().as_slice(),
            &[0xAA, 0x20, 0x02, 0x20, 0x03, 0xAB]
        );
    }
}
