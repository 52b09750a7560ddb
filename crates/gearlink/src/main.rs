mod cmd;
mod csvlog;
mod exit;
mod logging;
mod node;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "gearlink",
    version,
    about = "Gearbox test-bench telemetry link"
)]
struct Cli {
    /// Output format. Default: pretty on a terminal, json otherwise.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "GEARLINK_LOG",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_value() {
        let cli = Cli::try_parse_from([
            "gearlink",
            "send",
            "/dev/ttyACM0",
            "--kind",
            "oil_temperature",
            "--value",
            "60",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_mixed_typed_and_raw_send() {
        let err = Cli::try_parse_from([
            "gearlink",
            "send",
            "-",
            "--kind",
            "0x10",
            "--value",
            "60",
            "--tag",
            "0x7e",
            "--hex",
            "00",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn kind_requires_value() {
        let err = Cli::try_parse_from(["gearlink", "send", "-", "--kind", "brake_torque"])
            .expect_err("missing value should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_listen_with_unix_link() {
        let cli = Cli::try_parse_from([
            "gearlink",
            "listen",
            "unix:/tmp/bench.sock",
            "--count",
            "3",
            "--diagnostics",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(
                    args.link,
                    gearlink_transport::LinkTarget::Unix("/tmp/bench.sock".into())
                );
                assert_eq!(args.count, Some(3));
                assert!(args.diagnostics);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_bad_hex() {
        let err = Cli::try_parse_from(["gearlink", "decode", "--hex", "AA 1"])
            .expect_err("odd hex should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
