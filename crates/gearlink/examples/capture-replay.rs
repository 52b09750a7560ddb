//! Replay a binary capture through the frame assembler in small chunks.
//!
//! Run with:
//!   cargo run --features cli -- simulate - --ticks 20 > bench.bin
//!   cargo run --example capture-replay -- bench.bin

use gearlink::wire::{Decoded, FrameAssembler};

/// Roughly what a USB serial adapter hands over per read.
const CHUNK: usize = 64;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: capture-replay <FILE>")?;
    let bytes = std::fs::read(&path)?;

    let mut assembler = FrameAssembler::new();
    for chunk in bytes.chunks(CHUNK) {
        for event in assembler.feed(chunk) {
            match event {
                Decoded::Reading(value) => println!("{}", value.reading()),
                Decoded::Failure(failure) => eprintln!("dropped: {failure}"),
            }
        }
    }

    let stats = assembler.stats();
    eprintln!(
        "{} bytes, {} readings, {} garbage bytes, {} checksum failures, {} left over",
        bytes.len(),
        stats.readings,
        stats.garbage_bytes,
        stats.checksum_failures,
        assembler.buffered()
    );
    Ok(())
}
