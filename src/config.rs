//! Run configuration

use std::time::Duration;

/// Length of the aggregator reporting window.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// How long an established session is held open before teardown.
pub const HOLD_DURATION: Duration = Duration::from_secs(60);

/// Immutable configuration for a siege run
///
/// Created once from the CLI and shared read-only with every task.
#[derive(Debug, Clone)]
pub struct SiegeConfig {
    /// Number of concurrent session slots to launch
    pub connections: usize,

    /// Destination address (host:port)
    pub destination: String,

    /// RTMP application name sent during the connect handshake
    pub app_name: String,

    /// How long each established session is held open
    pub hold: Duration,

    /// Aggregator reporting window length
    pub report_interval: Duration,
}

impl SiegeConfig {
    /// Create a config with the default application name, hold duration,
    /// and reporting interval
    pub fn new(connections: usize, destination: impl Into<String>) -> Self {
        Self {
            connections,
            destination: destination.into(),
            app_name: "ql".to_string(),
            hold: HOLD_DURATION,
            report_interval: REPORT_INTERVAL,
        }
    }

    /// Set the application name for the connect handshake
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Set the hold duration for established sessions
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Set the aggregator reporting interval
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }
}
