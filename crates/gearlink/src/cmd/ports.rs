use gearlink_transport::available_serial_ports;
use tracing::warn;

use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_lines, OutputFormat};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let ports = available_serial_ports();
    if ports.is_empty() {
        warn!("no serial ports found");
    }
    print_lines(ports, format);
    Ok(SUCCESS)
}
