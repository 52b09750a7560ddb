use std::fs;
use std::io::Read;

use gearlink_wire::{Decoded, FrameAssembler, SensorValue};
use tracing::info;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_failure, print_readings, print_stats, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = load_input(&args)?;

    let mut assembler = FrameAssembler::new();
    let mut readings: Vec<SensorValue> = Vec::new();
    for event in assembler.feed(&bytes) {
        match event {
            Decoded::Reading(value) => readings.push(value),
            Decoded::Failure(failure) => {
                if args.diagnostics {
                    print_failure(&failure, None, format);
                }
            }
        }
    }

    print_readings(&readings, format);

    let stats = *assembler.stats();
    info!(
        input_bytes = bytes.len(),
        readings = stats.readings,
        trailing_bytes = assembler.buffered(),
        "decode finished"
    );
    if args.stats {
        print_stats(&stats, format);
    }

    // Bytes in, nothing valid out.
    if readings.is_empty() && !bytes.is_empty() {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn load_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return Ok(hex.0.clone());
    }

    match &args.file {
        Some(path) if path.as_os_str() != "-" => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(buf)
        }
    }
}
