use std::fmt;

use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::schema::{SensorKind, SensorValue};

/// The consumer-facing value of a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Float(f32),
    Integer(u64),
    /// Undecoded payload of an unrecognized sensor kind.
    Raw(Bytes),
}

impl ReadingValue {
    /// Numeric view for charting; `None` for raw payloads.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Float(v) => Some(f64::from(*v)),
            ReadingValue::Integer(v) => Some(*v as f64),
            ReadingValue::Raw(_) => None,
        }
    }
}

/// Floats print with one decimal like the dashboard; raw payloads print as
/// lowercase hex.
impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingValue::Float(v) => write!(f, "{v:.1}"),
            ReadingValue::Integer(v) => write!(f, "{v}"),
            ReadingValue::Raw(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02x}")),
        }
    }
}

impl Serialize for ReadingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ReadingValue::Float(v) => serializer.serialize_f32(*v),
            ReadingValue::Integer(v) => serializer.serialize_u64(*v),
            ReadingValue::Raw(_) => serializer.collect_str(self),
        }
    }
}

/// A decoded reading as handed to displays and loggers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub tag: u8,
    pub name: &'static str,
    pub value: ReadingValue,
    pub unit: &'static str,
}

impl From<&SensorValue> for SensorReading {
    fn from(value: &SensorValue) -> Self {
        let kind = value.kind();
        Self {
            kind,
            tag: kind.tag(),
            name: kind.name(),
            value: value.value(),
            unit: kind.unit(),
        }
    }
}

impl From<SensorValue> for SensorReading {
    fn from(value: SensorValue) -> Self {
        Self::from(&value)
    }
}

impl SensorValue {
    /// Consumer-facing view of this value.
    pub fn reading(&self) -> SensorReading {
        SensorReading::from(self)
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}: {}", self.name, self.value)
        } else {
            write!(f, "{}: {} {}", self.name, self.value, self.unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_carries_table_metadata() {
        let reading = SensorValue::OilTemperature(60.0).reading();
        assert_eq!(reading.kind, SensorKind::OilTemperature);
        assert_eq!(reading.tag, 0x10);
        assert_eq!(reading.name, "Oil temperature");
        assert_eq!(reading.value, ReadingValue::Float(60.0));
        assert_eq!(reading.unit, "°C");
        assert_eq!(reading.to_string(), "Oil temperature: 60.0 °C");
    }

    #[test]
    fn integer_readings_display_plainly() {
        let reading = SensorValue::PrimaryAxleSpeed(800).reading();
        assert_eq!(reading.value, ReadingValue::Integer(800));
        assert_eq!(reading.to_string(), "Primary axle: 800 rpm");
        assert_eq!(reading.value.as_f64(), Some(800.0));
    }

    #[test]
    fn raw_payload_displays_as_hex() {
        let reading = SensorValue::Unrecognized {
            tag: 0x99,
            payload: Bytes::from_static(&[0x0A, 0xFF, 0x00]),
        }
        .reading();
        assert_eq!(reading.value.to_string(), "0aff00");
        assert_eq!(reading.to_string(), "Unknown: 0aff00");
        assert_eq!(reading.value.as_f64(), None);
    }

    #[test]
    fn serializes_to_flat_json() {
        let json = serde_json::to_value(SensorValue::SecondaryAxleSpeed(300).reading()).unwrap();
        assert_eq!(json["kind"], "secondary_axle_speed");
        assert_eq!(json["tag"], 0x21);
        assert_eq!(json["value"], 300);
        assert_eq!(json["unit"], "rpm");
    }
}
