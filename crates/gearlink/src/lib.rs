//! Telemetry link between a gearbox test-bench sensor node and its host.
//!
//! The node streams one small frame per sensor reading over a serial line;
//! the host turns the raw byte stream back into typed readings, surviving
//! garbage, split reads and corrupted frames along the way.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte links (serial ports, Unix sockets, stdio)
//! - [`wire`]: frame codec, resynchronizing assembler, readers and writers

/// Re-export transport types.
pub mod transport {
    pub use gearlink_transport::*;
}

/// Re-export wire protocol types.
pub mod wire {
    pub use gearlink_wire::*;
}
