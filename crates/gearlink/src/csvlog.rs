//! Append-only CSV log of readings.
//!
//! One line per reading: `timestamp,name,value,unit`. The header is written
//! only when the file is empty, so restarting a session keeps appending to
//! the same log. Every line is flushed as soon as it is written.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use gearlink_wire::{ReadingValue, SensorReading};
use jiff::Timestamp;
use tracing::info;

pub const HEADER: &str = "timestamp,name,value,unit";

pub struct CsvLogger<W: Write> {
    out: W,
    lines: u64,
}

impl CsvLogger<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;
        let logger = Self::new(BufWriter::new(file), empty)?;
        info!(path = %path.display(), "logging readings to csv");
        Ok(logger)
    }
}

impl<W: Write> CsvLogger<W> {
    /// Wrap a writer; writes the header first when `write_header` is set.
    pub fn new(mut out: W, write_header: bool) -> io::Result<Self> {
        if write_header {
            writeln!(out, "{HEADER}")?;
            out.flush()?;
        }
        Ok(Self { out, lines: 0 })
    }

    pub fn log(&mut self, timestamp: Timestamp, reading: &SensorReading) -> io::Result<()> {
        writeln!(
            self.out,
            "{},{},{},{}",
            timestamp,
            field(reading.name),
            csv_value(&reading.value),
            field(reading.unit)
        )?;
        self.out.flush()?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written since this logger was opened, header excluded.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Full precision for floats; the unit has its own column.
fn csv_value(value: &ReadingValue) -> String {
    match value {
        ReadingValue::Float(v) => v.to_string(),
        other => other.to_string(),
    }
}

fn field(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
