//! Session slot: one virtual client
//!
//! A slot drives the attempt loop for a single connection: dial, handshake,
//! create the stream, and on success hold the session open for the
//! configured duration before closing it. Failed attempts are reported and
//! retried indefinitely; saturating a struggling target is the point of the
//! harness, so there is no backoff and no retry cap.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::config::SiegeConfig;
use crate::report::Outcome;
use crate::transport::{MediaSession, Transport, TransportError};

/// One virtual client slot
pub struct SessionSlot<T: Transport> {
    id: usize,
    transport: Arc<T>,
    config: SiegeConfig,
    outcomes: mpsc::Sender<Outcome>,
}

impl<T: Transport> SessionSlot<T> {
    /// Create a slot bound to the shared outcome channel
    pub fn new(
        id: usize,
        transport: Arc<T>,
        config: SiegeConfig,
        outcomes: mpsc::Sender<Outcome>,
    ) -> Self {
        Self {
            id,
            transport,
            config,
            outcomes,
        }
    }

    /// Run the attempt loop to completion
    ///
    /// Emits exactly one outcome per attempt: an unbounded sequence of
    /// failures followed by the slot's single success. After the success the
    /// session is held for the hold duration, closed once, and the task
    /// exits. The loop also stops if the outcome channel closes underneath
    /// it, since nothing can observe further attempts.
    pub async fn run(self) {
        loop {
            match self.establish().await {
                Ok(mut session) => {
                    if self.outcomes.send(Outcome::success()).await.is_err() {
                        session.close().await;
                        return;
                    }
                    sleep(self.config.hold).await;
                    session.close().await;
                    tracing::debug!(slot = self.id, "slot finished");
                    return;
                }
                Err(err) => {
                    if self.outcomes.send(Outcome::failure(&err)).await.is_err() {
                        tracing::debug!(slot = self.id, "outcome channel closed, slot stopping");
                        return;
                    }
                }
            }
        }
    }

    /// Drive one dial/handshake/create-stream attempt
    ///
    /// Any partially-established session is closed before the error is
    /// returned, so a failed attempt never leaks a connection.
    async fn establish(&self) -> Result<Box<dyn MediaSession>, TransportError> {
        let mut session = self.transport.connect(&self.config.destination).await?;

        if let Err(err) = session.handshake(&self.config.app_name).await {
            session.close().await;
            return Err(err);
        }

        if let Err(err) = session.create_stream().await {
            session.close().await;
            return Err(err);
        }

        Ok(session)
    }
}
