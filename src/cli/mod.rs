//! CLI argument parsing and run glue

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config::SiegeConfig;
use crate::runner::SiegeRunner;
use crate::transport::RtmpTransport;

/// rtmp-siege - concurrent session load generator for RTMP servers
#[derive(Parser, Debug)]
#[command(name = "rtmp-siege")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of concurrent sessions to open
    #[arg(long, default_value = "1000")]
    pub conns: usize,

    /// RTMP server address (host:port)
    #[arg(long, default_value = "localhost:11935")]
    pub dst: String,

    /// RTMP application name sent during the connect handshake
    #[arg(long, default_value = "ql")]
    pub app: String,

    /// Stream key requested once a session is established
    #[arg(long, default_value = "live")]
    pub stream_key: String,

    /// How long each established session is held open, in seconds
    #[arg(long, default_value = "60")]
    pub hold_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Run the siege based on CLI arguments
    pub async fn run(&self) -> Result<()> {
        validate_destination(&self.dst)
            .with_context(|| format!("invalid destination: {}", self.dst))?;

        let config = SiegeConfig::new(self.conns, self.dst.clone())
            .with_app_name(self.app.clone())
            .with_hold(Duration::from_secs(self.hold_secs));

        let transport = RtmpTransport::new(self.stream_key.clone());
        let runner = SiegeRunner::new(transport, config);
        runner.run().await?;

        Ok(())
    }
}

/// Check that the destination looks like host:port before any task starts
///
/// A malformed destination is a fatal startup error; transient connection
/// failures against a well-formed one are not.
pub fn validate_destination(dst: &str) -> Result<()> {
    let Some((host, port)) = dst.rsplit_once(':') else {
        bail!("expected host:port");
    };
    if host.is_empty() {
        bail!("missing host");
    }
    port.parse::<u16>()
        .with_context(|| format!("invalid port: {port}"))?;
    Ok(())
}
