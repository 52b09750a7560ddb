use gearlink_transport::LinkConfig;
use gearlink_wire::{ReadingWriter, SensorKind, SensorValue, WireConfig};
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{transport_error, wire_error, CliError, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let frame = resolve_frame(&args)?;

    let stream = args
        .link
        .connect(&LinkConfig {
            baud_rate: args.baud,
            ..LinkConfig::default()
        })
        .map_err(|err| transport_error("open failed", err))?;
    let mut writer = ReadingWriter::with_config_link(stream, WireConfig::default())
        .map_err(|err| wire_error("open failed", err))?;

    match &frame {
        Frame::Value(value) => writer.send(value),
        Frame::Raw { tag, payload } => writer.send_raw(*tag, payload),
    }
    .map_err(|err| wire_error("send failed", err))?;

    info!(link = %args.link, "frame sent");
    Ok(SUCCESS)
}

#[derive(Debug, PartialEq)]
enum Frame {
    Value(SensorValue),
    Raw { tag: u8, payload: Vec<u8> },
}

fn resolve_frame(args: &SendArgs) -> CliResult<Frame> {
    if let (Some(kind), Some(value)) = (args.kind, &args.value) {
        return parse_value(kind, value).map(Frame::Value);
    }
    if let (Some(tag), Some(hex)) = (args.tag, &args.hex) {
        return Ok(Frame::Raw {
            tag,
            payload: hex.0.clone(),
        });
    }
    Err(CliError::usage(
        "either --kind/--value or --tag/--hex is required",
    ))
}

fn parse_value(kind: SensorKind, text: &str) -> CliResult<SensorValue> {
    SensorValue::parse(kind, text).map_err(|err| CliError::usage(err.to_string()))
}

#[cfg(test)]
mod tests {
    use gearlink_transport::LinkTarget;

    use super::*;
    use crate::cmd::HexBytes;
    use crate::exit::USAGE;

    fn args() -> SendArgs {
        SendArgs {
            link: LinkTarget::Stdio,
            baud: 115_200,
            kind: None,
            value: None,
            tag: None,
            hex: None,
        }
    }

    #[test]
    fn value_uses_kind_codec() {
        assert_eq!(
            parse_value(SensorKind::OilTemperature, "60").unwrap(),
            SensorValue::OilTemperature(60.0)
        );
        assert_eq!(
            parse_value(SensorKind::PrimaryAxleSpeed, " 800 ").unwrap(),
            SensorValue::PrimaryAxleSpeed(800)
        );
    }

    #[test]
    fn integer_kinds_reject_fractions_and_overflow() {
        assert!(parse_value(SensorKind::PrimaryAxleSpeed, "12.5").is_err());
        assert!(parse_value(SensorKind::SecondaryAxleSpeed, "70000").is_err());
        assert!(parse_value(SensorKind::SecondaryAxleSpeed, "-1").is_err());
    }

    #[test]
    fn negative_floats_are_accepted() {
        assert_eq!(
            parse_value(SensorKind::AirTemperature, "-4.5").unwrap(),
            SensorValue::AirTemperature(-4.5)
        );
    }

    #[test]
    fn raw_frame_from_tag_and_hex() {
        let mut args = args();
        args.tag = Some(0x7E);
        args.hex = Some(HexBytes(vec![0xDE, 0xAD]));
        assert_eq!(
            resolve_frame(&args).unwrap(),
            Frame::Raw {
                tag: 0x7E,
                payload: vec![0xDE, 0xAD],
            }
        );
    }

    #[test]
    fn missing_frame_arguments_is_usage_error() {
        let err = resolve_frame(&args()).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
