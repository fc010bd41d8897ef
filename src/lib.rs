//! rtmp-siege - Concurrent session load generator for RTMP servers
//!
//! Opens a configurable number of simultaneous sessions against a target
//! RTMP endpoint, holds each one open for a fixed duration, and reports
//! aggregate success/failure throughput once per second until the requested
//! number of sessions has been established.
//!
//! # Architecture
//!
//! - **Transport**: the external session/transport collaborator (dial,
//!   handshake, stream creation, teardown), behind a trait seam
//! - **Session**: one virtual client slot retrying until its session sticks
//! - **Report**: the windowed outcome aggregator and its periodic summary
//! - **Runner**: spawns all slots plus the aggregator and awaits the run

pub mod cli;
pub mod config;
pub mod report;
pub mod runner;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::SiegeConfig;
pub use report::{Aggregator, Outcome, RunTotals, WindowReport};
pub use runner::SiegeRunner;
pub use session::SessionSlot;
pub use transport::{MediaSession, RtmpTransport, Transport, TransportError};
