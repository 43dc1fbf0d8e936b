//! The Event Transmitter (4.F): a batched, retrying, rate-limited client that
//! owns its buffer, failed-batch queue, and rate counters exclusively, the
//! way `WorkspaceSupervisor` owns its watch channel and exposes only
//! `start`/`receiver`.

pub mod config;
pub mod durable;
pub mod error;
pub mod stats;
pub mod transmitter;

pub use config::TransmitterConfig;
pub use error::{Error, Result};
pub use stats::TransmitterStats;
pub use transmitter::Transmitter;
