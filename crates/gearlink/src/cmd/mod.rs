use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use gearlink_transport::{LinkTarget, DEFAULT_BAUD_RATE};
use gearlink_wire::SensorKind;

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod kinds;
pub mod listen;
pub mod ports;
pub mod send;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a link and print decoded readings.
    Listen(ListenArgs),
    /// Encode and send a single frame.
    Send(SendArgs),
    /// Run a simulated sensor node.
    Simulate(SimulateArgs),
    /// Decode a captured byte dump offline.
    Decode(DecodeArgs),
    /// Show the sensor kind table.
    Kinds,
    /// List serial ports visible to this host.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Simulate(args) => simulate::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Kinds => kinds::run(format),
        Command::Ports => ports::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Link to read: serial device, `unix:PATH`, or `-` for stdin.
    #[arg(env = "GEARLINK_LINK")]
    pub link: LinkTarget,
    /// Serial baud rate.
    #[arg(long, env = "GEARLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Exit after printing N readings.
    #[arg(long)]
    pub count: Option<usize>,
    /// Append readings to a CSV file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
    /// Also print decode failures.
    #[arg(long)]
    pub diagnostics: bool,
    /// Reopen the link when it closes or fails instead of exiting.
    #[arg(long)]
    pub reconnect: bool,
    /// Pause between reconnect attempts (e.g. 2s, 500ms).
    #[arg(long, default_value = "1s")]
    pub reconnect_delay: String,
    /// Print decoder counters on exit.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Link to write: serial device, `unix:PATH`, or `-` for stdout.
    #[arg(env = "GEARLINK_LINK")]
    pub link: LinkTarget,
    /// Serial baud rate.
    #[arg(long, env = "GEARLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Sensor kind by name (`oil_temperature`) or tag (`0x10`).
    #[arg(long, value_parser = parse_kind, requires = "value", conflicts_with_all = ["tag", "hex"])]
    pub kind: Option<SensorKind>,
    /// Reading value, parsed with the kind's codec.
    #[arg(long, allow_hyphen_values = true, requires = "kind")]
    pub value: Option<String>,
    /// Raw tag byte for frames outside the sensor table.
    #[arg(long, value_parser = parse_byte, requires = "hex")]
    pub tag: Option<u8>,
    /// Raw payload as hex.
    #[arg(long, value_parser = hex_arg, requires = "tag")]
    pub hex: Option<HexBytes>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Link to drive: serial device, `unix:PATH` (bound and served), or `-` for stdout.
    #[arg(env = "GEARLINK_LINK")]
    pub link: LinkTarget,
    /// Serial baud rate.
    #[arg(long, env = "GEARLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Pause between sensor sweeps (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Stop after N sweeps.
    #[arg(long)]
    pub ticks: Option<u64>,
    /// Seed for the brake and air temperature models.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Inject random line noise between sweeps.
    #[arg(long)]
    pub noise: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Bytes as hex (`AA 10 04 ...`).
    #[arg(long, value_parser = hex_arg, conflicts_with = "file")]
    pub hex: Option<HexBytes>,
    /// Binary capture file; `-` reads stdin. Default: stdin.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Also print decode failures.
    #[arg(long)]
    pub diagnostics: bool,
    /// Print decoder counters after the readings.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Byte string given on the command line as hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

fn hex_arg(input: &str) -> Result<HexBytes, String> {
    parse_hex(input).map(HexBytes)
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

/// Parse hex bytes, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {input:?}"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|_| "invalid hex".to_string())?;
            u8::from_str_radix(text, 16).map_err(|_| format!("invalid hex byte {text:?}"))
        })
        .collect()
}

/// Parse a byte as `0x10` hex or plain decimal.
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid byte {input:?}"))
}

/// Parse a table sensor kind by name or tag.
///
/// Names match case-insensitively with `_`/`-` ignored, so
/// `oil_temperature`, `oil-temperature` and `OilTemperature` are equivalent.
pub fn parse_kind(input: &str) -> Result<SensorKind, String> {
    if let Ok(tag) = parse_byte(input) {
        let kind = SensorKind::from_tag(tag);
        return if kind.is_known() {
            Ok(kind)
        } else {
            Err(format!("tag 0x{tag:02x} has no codec; use --tag/--hex"))
        };
    }

    let wanted = normalize(input);
    SensorKind::KNOWN
        .iter()
        .copied()
        .find(|kind| normalize(&format!("{kind:?}")) == wanted)
        .ok_or_else(|| format!("unknown sensor kind {input:?}"))
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
