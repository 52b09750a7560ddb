use std::fmt;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gearlink_transport::{LinkConfig, LinkStream, LinkTarget};
use gearlink_wire::{Decoded, ReadingReader, WireConfig, WireError};
use jiff::Timestamp;
use serde::Serialize;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::csvlog::CsvLogger;
use crate::exit::{io_error, transport_error, wire_error, CliError, CliResult, SUCCESS};
use crate::output::{print_failure, print_link_event, print_reading, print_stats, OutputFormat};

/// How often a blocked read wakes up to check for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Link state changes reported alongside readings.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LinkEvent {
    Connected {
        link: String,
        timestamp: Timestamp,
    },
    Disconnected {
        link: String,
        reason: String,
        timestamp: Timestamp,
    },
}

impl LinkEvent {
    fn connected(link: &LinkTarget) -> Self {
        LinkEvent::Connected {
            link: link.to_string(),
            timestamp: Timestamp::now(),
        }
    }

    fn disconnected(link: &LinkTarget, reason: impl Into<String>) -> Self {
        LinkEvent::Disconnected {
            link: link.to_string(),
            reason: reason.into(),
            timestamp: Timestamp::now(),
        }
    }
}

impl fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEvent::Connected { link, .. } => write!(f, "connected to {link}"),
            LinkEvent::Disconnected { link, reason, .. } => {
                write!(f, "disconnected from {link}: {reason}")
            }
        }
    }
}

enum Session {
    /// `--count` reached or Ctrl-C pressed.
    Done,
    /// The link went away; the reader keeps any partial frame.
    Lost(String),
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let reconnect_delay = parse_duration(&args.reconnect_delay)?;
    let mut logger = match &args.log_file {
        Some(path) => Some(CsvLogger::open(path).map_err(|err| {
            io_error(&format!("failed opening {}", path.display()), err)
        })?),
        None => None,
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let link_config = LinkConfig {
        baud_rate: args.baud,
        read_timeout: Some(POLL_INTERVAL),
        write_timeout: None,
    };
    let wire_config = WireConfig {
        read_timeout: Some(POLL_INTERVAL),
        ..WireConfig::default()
    };

    let stream = args
        .link
        .connect(&link_config)
        .map_err(|err| transport_error("open failed", err))?;
    let mut reader = ReadingReader::with_config_link(stream, wire_config)
        .map_err(|err| wire_error("open failed", err))?;
    print_link_event(&LinkEvent::connected(&args.link), format);

    let mut printed = 0usize;
    loop {
        let session = read_session(
            &mut reader,
            &args,
            format,
            logger.as_mut(),
            &running,
            &mut printed,
        )?;

        let reason = match session {
            Session::Done => break,
            Session::Lost(reason) => reason,
        };
        warn!(link = %args.link, %reason, "link lost");
        print_link_event(&LinkEvent::disconnected(&args.link, &reason), format);
        if !args.reconnect {
            break;
        }

        match reopen(&args.link, &link_config, reconnect_delay, &running) {
            Some(stream) => {
                reader.replace_inner(stream);
                print_link_event(&LinkEvent::connected(&args.link), format);
            }
            None => break,
        }
    }

    let stats = *reader.stats();
    info!(
        readings = stats.readings,
        frames = stats.frames,
        garbage_bytes = stats.garbage_bytes,
        checksum_failures = stats.checksum_failures,
        "listen finished"
    );
    if args.stats {
        print_stats(&stats, format);
    }

    Ok(SUCCESS)
}

fn read_session(
    reader: &mut ReadingReader<LinkStream>,
    args: &ListenArgs,
    format: OutputFormat,
    mut logger: Option<&mut CsvLogger<std::io::BufWriter<std::fs::File>>>,
    running: &AtomicBool,
    printed: &mut usize,
) -> CliResult<Session> {
    while running.load(Ordering::SeqCst) {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(WireError::Io(err))
                if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
            {
                continue
            }
            Err(WireError::ConnectionClosed) => {
                return Ok(Session::Lost("end of stream".to_string()))
            }
            Err(WireError::Io(err)) => return Ok(Session::Lost(err.to_string())),
            Err(WireError::Transport(err)) => return Ok(Session::Lost(err.to_string())),
            Err(err) => return Err(wire_error("receive failed", err)),
        };

        let now = Timestamp::now();
        match event {
            Decoded::Reading(value) => {
                print_reading(&value, Some(now), format);
                if let Some(logger) = logger.as_deref_mut() {
                    logger
                        .log(now, &value.reading())
                        .map_err(|err| io_error("csv log write failed", err))?;
                }

                *printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| *printed >= count) {
                    return Ok(Session::Done);
                }
            }
            Decoded::Failure(failure) => {
                if args.diagnostics {
                    print_failure(&failure, Some(now), format);
                }
            }
        }
    }

    Ok(Session::Done)
}

/// Retry opening the link until it succeeds or Ctrl-C is pressed.
fn reopen(
    target: &LinkTarget,
    config: &LinkConfig,
    delay: Duration,
    running: &AtomicBool,
) -> Option<LinkStream> {
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(delay);
        match target.connect(config) {
            Ok(stream) => return Some(stream),
            Err(err) => warn!(link = %target, error = %err, "reconnect failed"),
        }
    }
    None
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_event_json_shape() {
        let event = LinkEvent::Disconnected {
            link: "/dev/ttyACM0".to_string(),
            reason: "end of stream".to_string(),
            timestamp: "2024-05-01T12:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "disconnected");
        assert_eq!(json["link"], "/dev/ttyACM0");
        assert_eq!(json["reason"], "end of stream");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn link_event_display() {
        let event = LinkEvent::connected(&LinkTarget::Stdio);
        assert_eq!(event.to_string(), "connected to -");
    }
}
