//! Host and sensor node talking over a Unix socket in one process.
//!
//! The node thread sends a few readings with line noise and one corrupted
//! frame mixed in; the host prints what survives and the decoder counters.
//!
//! Run with:
//!   cargo run --example bench-monitor

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;
    use std::thread;

    use gearlink::transport::UnixLinkListener;
    use gearlink::wire::{Decoded, ReadingReader, ReadingWriter, SensorValue, WireError};

    let sock_dir = std::env::temp_dir().join(format!("gearlink-bench-{}", std::process::id()));
    fs::create_dir_all(&sock_dir)?;
    let sock_path = sock_dir.join("bench.sock");

    let listener = UnixLinkListener::bind(&sock_path)?;
    eprintln!("Listening on {}", sock_path.display());

    let node_path = sock_path.clone();
    let node = thread::spawn(
        move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let stream = UnixLinkListener::connect(&node_path)?;
            let mut writer = ReadingWriter::new(stream);

            writer.send_noise(&[0x00, 0xFF, 0x13])?;
            writer.send(&SensorValue::OilTemperature(72.5))?;
            writer.send(&SensorValue::PrimaryAxleSpeed(1850))?;
            // Checksum byte deliberately wrong.
            writer.send_noise(&[0xAA, 0x21, 0x02, 0x20, 0x03, 0x00])?;
            writer.send(&SensorValue::GearboxTorque(212.5))?;
            writer.send_raw(0x7E, &[0xCA, 0xFE])?;
            Ok(())
        },
    );

    let mut reader = ReadingReader::new(listener.accept()?);
    loop {
        match reader.read_event() {
            Ok(Decoded::Reading(value)) => println!("{}", value.reading()),
            Ok(Decoded::Failure(failure)) => eprintln!("dropped: {failure}"),
            Err(WireError::ConnectionClosed) => break,
            Err(err) => return Err(err.into()),
        }
    }

    if let Err(err) = node.join().map_err(|_| "node thread panicked")? {
        eprintln!("node error: {err}");
    }

    eprintln!("{:?}", reader.stats());
    drop(listener);
    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("bench-monitor needs Unix domain sockets");
}
