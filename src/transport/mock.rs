//! Mock transport shared by session and runner tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{MediaSession, Transport, TransportError};

/// Which establishment step the mock fails at
#[derive(Debug, Clone, Copy)]
pub(crate) enum FailStage {
    Connect,
    Handshake,
    CreateStream,
}

/// Transport that fails a configurable number of attempts before starting
/// to succeed
///
/// The failure budget is shared across all slots using the transport, so
/// `with_failures(10)` means exactly ten failed attempts over the whole run
/// regardless of interleaving.
pub(crate) struct MockTransport {
    remaining_failures: AtomicUsize,
    fail_stage: FailStage,
    closes: Arc<AtomicUsize>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            remaining_failures: AtomicUsize::new(0),
            fail_stage: FailStage::Connect,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_failures(mut self, n: usize) -> Self {
        self.remaining_failures = AtomicUsize::new(n);
        self
    }

    pub(crate) fn with_fail_stage(mut self, stage: FailStage) -> Self {
        self.fail_stage = stage;
        self
    }

    /// Counter of session closes performed through this transport
    pub(crate) fn closes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    fn claim_failure(&self) -> bool {
        self.remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _destination: &str) -> Result<Box<dyn MediaSession>, TransportError> {
        if matches!(self.fail_stage, FailStage::Connect) && self.claim_failure() {
            return Err(TransportError::Connect(
                "synthetic connect failure".to_string(),
            ));
        }

        let fail_handshake =
            matches!(self.fail_stage, FailStage::Handshake) && self.claim_failure();
        let fail_create =
            matches!(self.fail_stage, FailStage::CreateStream) && self.claim_failure();

        Ok(Box::new(MockSession {
            fail_handshake,
            fail_create,
            closed: false,
            closes: Arc::clone(&self.closes),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub(crate) struct MockSession {
    fail_handshake: bool,
    fail_create: bool,
    closed: bool,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl MediaSession for MockSession {
    async fn handshake(&mut self, _app: &str) -> Result<(), TransportError> {
        if self.fail_handshake {
            Err(TransportError::Handshake(
                "synthetic handshake failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn create_stream(&mut self) -> Result<(), TransportError> {
        if self.fail_create {
            Err(TransportError::CreateStream(
                "synthetic stream failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
