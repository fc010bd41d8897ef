//! Transport collaborator seam
//!
//! The session/transport protocol is external to the harness: slots only see
//! the four primitives below (dial, handshake, stream creation, teardown).
//! The production implementation is [`RtmpTransport`]; tests substitute
//! mocks behind the same traits.

pub mod rtmp;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use rtmp::RtmpTransport;

/// Errors raised while establishing a session
///
/// Every variant is transient from the harness's point of view: the
/// originating slot converts it into a failure outcome and retries. Fatal
/// configuration problems are caught before any slot starts and never
/// surface through this type.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Dialing the destination failed
    #[error("connect failed: {0}")]
    Connect(String),

    /// The application-level connect handshake failed
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Creating the logical stream on an established session failed
    #[error("stream creation failed: {0}")]
    CreateStream(String),
}

/// An established logical connection to the target server
///
/// Owned by exactly one session slot and never shared; the owning slot
/// closes it on every exit path.
#[async_trait]
pub trait MediaSession: Send {
    /// Perform the application-level connect handshake
    async fn handshake(&mut self, app: &str) -> Result<(), TransportError>;

    /// Create the logical stream carried by this session
    async fn create_stream(&mut self) -> Result<(), TransportError>;

    /// Release the session and any stream built on it
    ///
    /// Safe to call more than once and on sessions that never fully
    /// initialized.
    async fn close(&mut self);
}

/// Client-library seam used by session slots to dial the target
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new session against the destination address
    async fn connect(&self, destination: &str) -> Result<Box<dyn MediaSession>, TransportError>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
