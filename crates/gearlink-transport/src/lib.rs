//! Byte-stream links for gearlink telemetry.
//!
//! The sensor node and the host talk over an ordered, reliable byte stream
//! that carries no framing of its own:
//! - Serial ports (the production link)
//! - Unix domain sockets (bench setups and simulators)
//! - Standard input/output (pipes and captured dumps)
//!
//! Everything above this layer reads and writes through [`LinkStream`].

pub mod error;
pub mod target;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use target::{available_serial_ports, LinkConfig, LinkTarget, DEFAULT_BAUD_RATE};
pub use traits::LinkStream;

#[cfg(unix)]
pub use uds::UnixLinkListener;
