//! Sensor kinds and their payload codecs.
//!
//! The table at the bottom of this file is the only place a sensor tag,
//! payload type, display name or unit is written down. Both the encoder and
//! the decoder dispatch through the types it generates, so the two directions
//! cannot drift apart.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::DecodeFailure;
use crate::reading::ReadingValue;

/// How a payload is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadCodec {
    /// IEEE-754 single precision, little-endian.
    F32Le,
    /// Unsigned 16-bit integer, little-endian.
    U16Le,
}

impl PayloadCodec {
    /// Payload width in bytes.
    pub const fn width(self) -> usize {
        match self {
            PayloadCodec::F32Le => 4,
            PayloadCodec::U16Le => 2,
        }
    }

    /// Short human-readable description.
    pub const fn describe(self) -> &'static str {
        match self {
            PayloadCodec::F32Le => "float32 LE",
            PayloadCodec::U16Le => "uint16 LE",
        }
    }
}

/// A fixed-width numeric type that can travel as a sensor payload.
pub trait WireScalar: Copy {
    const CODEC: PayloadCodec;

    /// Decode from exactly `CODEC.width()` bytes; `None` on any other length.
    fn read_le(payload: &[u8]) -> Option<Self>;

    fn write_le(self, dst: &mut BytesMut);

    fn reading_value(self) -> ReadingValue;
}

impl WireScalar for f32 {
    const CODEC: PayloadCodec = PayloadCodec::F32Le;

    fn read_le(payload: &[u8]) -> Option<Self> {
        payload.try_into().ok().map(f32::from_le_bytes)
    }

    fn write_le(self, dst: &mut BytesMut) {
        dst.put_f32_le(self);
    }

    fn reading_value(self) -> ReadingValue {
        ReadingValue::Float(self)
    }
}

impl WireScalar for u16 {
    const CODEC: PayloadCodec = PayloadCodec::U16Le;

    fn read_le(payload: &[u8]) -> Option<Self> {
        payload.try_into().ok().map(u16::from_le_bytes)
    }

    fn write_le(self, dst: &mut BytesMut) {
        dst.put_u16_le(self);
    }

    fn reading_value(self) -> ReadingValue {
        ReadingValue::Integer(u64::from(self))
    }
}

/// Text that does not parse as a value of the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseValueError {
    #[error("invalid value {text:?} for {kind}: {reason}")]
    Invalid {
        kind: SensorKind,
        text: String,
        reason: String,
    },

    #[error("tag 0x{0:02x} has no codec")]
    NoCodec(u8),
}

macro_rules! sensor_table {
    ($(
        $(#[$meta:meta])*
        $variant:ident = $tag:literal => $ty:ty, $name:literal, $unit:literal;
    )*) => {
        /// Sensor kind carried in the frame's type byte.
        ///
        /// Tags outside the table decode as [`SensorKind::Unrecognized`]
        /// instead of failing.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum SensorKind {
            $( $(#[$meta])* $variant, )*
            /// A tag this build does not know about.
            Unrecognized(u8),
        }

        impl SensorKind {
            /// Every kind with a codec, in table order.
            pub const KNOWN: &'static [SensorKind] = &[$(SensorKind::$variant),*];

            pub const fn from_tag(tag: u8) -> Self {
                match tag {
                    $( $tag => SensorKind::$variant, )*
                    other => SensorKind::Unrecognized(other),
                }
            }

            pub const fn tag(self) -> u8 {
                match self {
                    $( SensorKind::$variant => $tag, )*
                    SensorKind::Unrecognized(tag) => tag,
                }
            }

            /// The payload codec, or `None` for unrecognized tags.
            pub const fn codec(self) -> Option<PayloadCodec> {
                match self {
                    $( SensorKind::$variant => Some(<$ty as WireScalar>::CODEC), )*
                    SensorKind::Unrecognized(_) => None,
                }
            }

            /// Display name shown on dashboards and in logs.
            pub const fn name(self) -> &'static str {
                match self {
                    $( SensorKind::$variant => $name, )*
                    SensorKind::Unrecognized(_) => "Unknown",
                }
            }

            /// Unit label; empty for unrecognized tags.
            pub const fn unit(self) -> &'static str {
                match self {
                    $( SensorKind::$variant => $unit, )*
                    SensorKind::Unrecognized(_) => "",
                }
            }

            pub const fn is_known(self) -> bool {
                !matches!(self, SensorKind::Unrecognized(_))
            }
        }

        /// One typed sensor value, as carried by a single frame.
        #[derive(Debug, Clone, PartialEq)]
        pub enum SensorValue {
            $( $(#[$meta])* $variant($ty), )*
            /// Payload of a frame whose tag has no codec, passed through as-is.
            Unrecognized { tag: u8, payload: Bytes },
        }

        impl SensorValue {
            pub fn kind(&self) -> SensorKind {
                match self {
                    $( SensorValue::$variant(_) => SensorKind::$variant, )*
                    SensorValue::Unrecognized { tag, .. } => SensorKind::Unrecognized(*tag),
                }
            }

            /// The value as shown to consumers.
            pub fn value(&self) -> ReadingValue {
                match self {
                    $( SensorValue::$variant(v) => v.reading_value(), )*
                    SensorValue::Unrecognized { payload, .. } => ReadingValue::Raw(payload.clone()),
                }
            }

            /// Decode a checksum-verified payload for `kind`.
            pub fn decode(kind: SensorKind, payload: Bytes) -> Result<Self, DecodeFailure> {
                match kind {
                    $(
                        SensorKind::$variant => <$ty as WireScalar>::read_le(&payload)
                            .map(SensorValue::$variant)
                            .ok_or(DecodeFailure::WidthMismatch {
                                kind,
                                expected: <$ty as WireScalar>::CODEC.width(),
                                actual: payload.len(),
                            }),
                    )*
                    SensorKind::Unrecognized(tag) => Ok(SensorValue::Unrecognized { tag, payload }),
                }
            }

            /// Parse a value typed by an operator, using the kind's scalar type.
            pub fn parse(kind: SensorKind, text: &str) -> Result<Self, ParseValueError> {
                match kind {
                    $(
                        SensorKind::$variant => text
                            .trim()
                            .parse::<$ty>()
                            .map(SensorValue::$variant)
                            .map_err(|err| ParseValueError::Invalid {
                                kind,
                                text: text.to_string(),
                                reason: err.to_string(),
                            }),
                    )*
                    SensorKind::Unrecognized(tag) => Err(ParseValueError::NoCodec(tag)),
                }
            }

            /// Number of payload bytes this value occupies on the wire.
            pub fn payload_len(&self) -> usize {
                match self {
                    $( SensorValue::$variant(_) => <$ty as WireScalar>::CODEC.width(), )*
                    SensorValue::Unrecognized { payload, .. } => payload.len(),
                }
            }

            /// Append the raw payload bytes (no header, no checksum).
            pub fn write_payload(&self, dst: &mut BytesMut) {
                match self {
                    $( SensorValue::$variant(v) => v.write_le(dst), )*
                    SensorValue::Unrecognized { payload, .. } => dst.put_slice(payload),
                }
            }
        }
    };
}

sensor_table! {
    OilTemperature = 0x10 => f32, "Oil temperature", "°C";
    PrimaryAxleSpeed = 0x20 => u16, "Primary axle", "rpm";
    SecondaryAxleSpeed = 0x21 => u16, "Secondary axle", "rpm";
    GearboxTorque = 0x30 => f32, "Gearbox torque", "N·m";
    BrakeTorque = 0x31 => f32, "Brake torque", "N·m";
    AirTemperature = 0x40 => f32, "Air temperature", "°C";
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip_through_kind() {
        for kind in SensorKind::KNOWN {
            assert_eq!(SensorKind::from_tag(kind.tag()), *kind);
            assert!(kind.is_known());
        }
    }

    #[test]
    fn unknown_tag_is_preserved() {
        let kind = SensorKind::from_tag(0xFF);
        assert_eq!(kind, SensorKind::Unrecognized(0xFF));
        assert_eq!(kind.tag(), 0xFF);
        assert_eq!(kind.codec(), None);
        assert_eq!(kind.unit(), "");
        assert_eq!(kind.name(), "Unknown");
    }

    #[test]
    fn firmware_tag_values() {
        assert_eq!(SensorKind::OilTemperature.tag(), 0x10);
        assert_eq!(SensorKind::PrimaryAxleSpeed.tag(), 0x20);
        assert_eq!(SensorKind::SecondaryAxleSpeed.tag(), 0x21);
        assert_eq!(SensorKind::GearboxTorque.tag(), 0x30);
        assert_eq!(SensorKind::BrakeTorque.tag(), 0x31);
        assert_eq!(SensorKind::AirTemperature.tag(), 0x40);
    }

    #[test]
    fn codec_widths_match_table() {
        assert_eq!(SensorKind::OilTemperature.codec(), Some(PayloadCodec::F32Le));
        assert_eq!(SensorKind::PrimaryAxleSpeed.codec(), Some(PayloadCodec::U16Le));
        assert_eq!(PayloadCodec::F32Le.width(), 4);
        assert_eq!(PayloadCodec::U16Le.width(), 2);
        assert_eq!(SensorKind::GearboxTorque.unit(), "N·m");
        assert_eq!(SensorKind::AirTemperature.unit(), "°C");
    }

    #[test]
    fn decode_rejects_wrong_width() {
        let err = SensorValue::decode(
            SensorKind::OilTemperature,
            Bytes::from_static(&[0x00, 0x00]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DecodeFailure::WidthMismatch {
                kind: SensorKind::OilTemperature,
                expected: 4,
                actual: 2,
            }
        );
    }

    #[test]
    fn decode_passes_unknown_payload_through() {
        let value = SensorValue::decode(
            SensorKind::Unrecognized(0x7E),
            Bytes::from_static(&[0xDE, 0xAD]),
        )
        .unwrap();
        assert_eq!(
            value,
            SensorValue::Unrecognized {
                tag: 0x7E,
                payload: Bytes::from_static(&[0xDE, 0xAD]),
            }
        );
        assert_eq!(value.kind(), SensorKind::Unrecognized(0x7E));
    }

    #[test]
    fn payload_bytes_are_little_endian() {
        let mut buf = BytesMut::new();
        SensorValue::PrimaryAxleSpeed(800).write_payload(&mut buf);
        assert_eq!(buf.as_ref(), &[0x20, 0x03]);

        buf.clear();
        SensorValue::OilTemperature(60.0).write_payload(&mut buf);
        assert_eq!(buf.as_ref(), &[0x00, 0x00, 0x70, 0x42]);
    }

    #[test]
    fn display_includes_tag() {
        assert_eq!(
            SensorKind::BrakeTorque.to_string(),
            "Brake torque (0x31)"
        );
    }

    #[test]
    fn parse_uses_each_kind_scalar_type() {
        assert_eq!(
            SensorValue::parse(SensorKind::GearboxTorque, " 102.5 ").unwrap(),
            SensorValue::GearboxTorque(102.5)
        );
        assert_eq!(
            SensorValue::parse(SensorKind::SecondaryAxleSpeed, "325").unwrap(),
            SensorValue::SecondaryAxleSpeed(325)
        );
        for kind in SensorKind::KNOWN {
            let value = SensorValue::parse(*kind, "7").unwrap();
            assert_eq!(value.kind(), *kind);
        }
    }

    #[test]
    fn parse_rejects_text_outside_the_scalar_type() {
        assert!(matches!(
            SensorValue::parse(SensorKind::PrimaryAxleSpeed, "70000"),
            Err(ParseValueError::Invalid {
                kind: SensorKind::PrimaryAxleSpeed,
                ..
            })
        ));
        assert!(SensorValue::parse(SensorKind::PrimaryAxleSpeed, "1.5").is_err());
        assert!(SensorValue::parse(SensorKind::OilTemperature, "hot").is_err());
        assert_eq!(
            SensorValue::parse(SensorKind::Unrecognized(0x7E), "1"),
            Err(ParseValueError::NoCodec(0x7E))
        );
    }
}
