use std::io::{IsTerminal, Write};

use bytes::BytesMut;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gearlink_wire::{
    encode_value, AssemblerStats, DecodeFailure, SensorKind, SensorReading, SensorValue,
};
use jiff::Timestamp;
use serde::Serialize;

use crate::cmd::listen::LinkEvent;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    Table,
    /// `name: value unit` lines.
    Pretty,
    /// Re-encoded frames, byte-exact, for capture files.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReadingRecord<'a> {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<Timestamp>,
    #[serde(flatten)]
    reading: &'a SensorReading,
}

#[derive(Serialize)]
struct FailureRecord<'a> {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<Timestamp>,
    message: String,
    #[serde(flatten)]
    failure: &'a DecodeFailure,
}

#[derive(Serialize)]
struct KindRecord {
    tag: u8,
    kind: SensorKind,
    name: &'static str,
    codec: &'static str,
    width: usize,
    unit: &'static str,
}

pub fn print_reading(value: &SensorValue, timestamp: Option<Timestamp>, format: OutputFormat) {
    let reading = value.reading();
    match format {
        OutputFormat::Json => print_json(&ReadingRecord {
            event: "reading",
            timestamp,
            reading: &reading,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TAG", "NAME", "VALUE", "UNIT"]);
            table.add_row(reading_row(&reading));
            println!("{table}");
        }
        OutputFormat::Pretty => match timestamp {
            Some(ts) => println!("{ts} {reading}"),
            None => println!("{reading}"),
        },
        OutputFormat::Raw => print_raw(&frame_bytes(value)),
    }
}

/// Print many readings at once; table output gets a single table.
pub fn print_readings(values: &[SensorValue], format: OutputFormat) {
    if format != OutputFormat::Table {
        for value in values {
            print_reading(value, None, format);
        }
        return;
    }

    let mut table = new_table(vec!["TAG", "NAME", "VALUE", "UNIT"]);
    for value in values {
        table.add_row(reading_row(&value.reading()));
    }
    println!("{table}");
}

/// Decode failures go to stdout only when asked for; raw output never
/// carries them.
pub fn print_failure(failure: &DecodeFailure, timestamp: Option<Timestamp>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FailureRecord {
            event: "decode_failure",
            timestamp,
            message: failure.to_string(),
            failure,
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("! {failure}"),
        OutputFormat::Raw => {}
    }
}

pub fn print_link_event(event: &LinkEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(event),
        OutputFormat::Table | OutputFormat::Pretty => println!("* {event}"),
        OutputFormat::Raw => {}
    }
}

pub fn print_kinds(format: OutputFormat) {
    let records: Vec<KindRecord> = SensorKind::KNOWN
        .iter()
        .filter_map(|kind| {
            kind.codec().map(|codec| KindRecord {
                tag: kind.tag(),
                kind: *kind,
                name: kind.name(),
                codec: codec.describe(),
                width: codec.width(),
                unit: kind.unit(),
            })
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Table | OutputFormat::Raw => {
            let mut table = new_table(vec!["TAG", "NAME", "CODEC", "WIDTH", "UNIT"]);
            for record in &records {
                table.add_row(vec![
                    format!("0x{:02x}", record.tag),
                    record.name.to_string(),
                    record.codec.to_string(),
                    record.width.to_string(),
                    record.unit.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in &records {
                println!(
                    "0x{:02x}  {:<16} {:<10} {} bytes  {}",
                    record.tag, record.name, record.codec, record.width, record.unit
                );
            }
        }
    }
}

pub fn print_stats(stats: &AssemblerStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "event": "stats",
            "stats": stats,
        })),
        OutputFormat::Table | OutputFormat::Pretty => {
            let mut table = new_table(vec!["COUNTER", "VALUE"]);
            for (name, value) in [
                ("frames", stats.frames),
                ("readings", stats.readings),
                ("garbage_bytes", stats.garbage_bytes),
                ("checksum_failures", stats.checksum_failures),
                ("width_mismatches", stats.width_mismatches),
                ("overflow_bytes", stats.overflow_bytes),
            ] {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_lines<I: IntoIterator<Item = String>>(lines: I, format: OutputFormat) {
    let lines: Vec<String> = lines.into_iter().collect();
    match format {
        OutputFormat::Json => print_json(&lines),
        _ => {
            for line in lines {
                println!("{line}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Wire bytes for `value`; empty if it cannot be framed.
fn frame_bytes(value: &SensorValue) -> Vec<u8> {
    let mut buf = BytesMut::new();
    match encode_value(value, &mut buf) {
        Ok(()) => buf.to_vec(),
        Err(_) => Vec::new(),
    }
}

fn reading_row(reading: &SensorReading) -> Vec<String> {
    vec![
        format!("0x{:02x}", reading.tag),
        reading.name.to_string(),
        reading.value.to_string(),
        reading.unit.to_string(),
    ]
}
