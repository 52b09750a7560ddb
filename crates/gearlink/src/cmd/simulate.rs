use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gearlink_transport::{LinkConfig, LinkStream, LinkTarget};
use gearlink_wire::{ReadingWriter, WireConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::cmd::{parse_duration, SimulateArgs};
use crate::exit::{transport_error, wire_error, CliError, CliResult, SUCCESS};
use crate::node::SimSensor;

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)).map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })?;

    // Keeps a bound socket alive (and its path on disk) for the whole run.
    #[cfg(unix)]
    let mut _listener = None;

    let stream = match &args.link {
        #[cfg(unix)]
        LinkTarget::Unix(path) => {
            let listener = gearlink_transport::UnixLinkListener::bind(path)
                .map_err(|err| transport_error("bind failed", err))?;
            info!(path = %path.display(), "waiting for host");
            let stream = listener
                .accept()
                .map_err(|err| transport_error("accept failed", err))?;
            _listener = Some(listener);
            stream
        }
        target => target
            .connect(&LinkConfig {
                baud_rate: args.baud,
                ..LinkConfig::default()
            })
            .map_err(|err| transport_error("open failed", err))?,
    };

    info!(link = %args.link, seed, ?interval, "sensor node running");
    let sent = drive(stream, &mut rng, &args, interval, &running)?;
    info!(frames = sent, "sensor node stopped");

    Ok(SUCCESS)
}

fn drive<R: Rng>(
    stream: LinkStream,
    rng: &mut R,
    args: &SimulateArgs,
    interval: std::time::Duration,
    running: &AtomicBool,
) -> CliResult<u64> {
    let mut writer = ReadingWriter::with_config_link(stream, WireConfig::default())
        .map_err(|err| wire_error("open failed", err))?;
    let mut bench = SimSensor::bench();
    let mut sent = 0u64;
    let mut tick = 0u64;

    while running.load(Ordering::SeqCst) {
        if args.ticks.is_some_and(|ticks| tick >= ticks) {
            break;
        }
        if tick > 0 && !interval.is_zero() {
            std::thread::sleep(interval);
        }

        for sensor in &mut bench {
            sensor.step(rng);
            writer
                .send(&sensor.value())
                .map_err(|err| wire_error("send failed", err))?;
            sent += 1;
        }

        if args.noise && rng.random_ratio(1, 4) {
            let len = rng.random_range(1..8);
            let noise: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            debug!(bytes = noise.len(), "injecting line noise");
            writer
                .send_noise(&noise)
                .map_err(|err| wire_error("send failed", err))?;
        }

        tick += 1;
    }

    Ok(sent)
}
