//! RTMP transport backed by the `rml_rtmp` client session
//!
//! The wire protocol lives entirely in `rml_rtmp`; this module only shuttles
//! bytes between its sans-io state machine and a tokio TCP stream.

use async_trait::async_trait;
use rml_rtmp::handshake::{Handshake, HandshakeProcessResult, PeerType};
use rml_rtmp::sessions::{
    ClientSession, ClientSessionConfig, ClientSessionEvent, ClientSessionResult,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{MediaSession, Transport, TransportError};

const READ_BUFFER_SIZE: usize = 4096;

/// RTMP client transport
///
/// `create_stream` requests playback of `stream_key`; `rml_rtmp` couples
/// stream creation with the play request, so the key is part of the
/// transport rather than the per-run configuration.
#[derive(Debug, Clone)]
pub struct RtmpTransport {
    stream_key: String,
}

impl RtmpTransport {
    /// Create a transport that will request playback of `stream_key`
    pub fn new(stream_key: impl Into<String>) -> Self {
        Self {
            stream_key: stream_key.into(),
        }
    }
}

#[async_trait]
impl Transport for RtmpTransport {
    async fn connect(&self, destination: &str) -> Result<Box<dyn MediaSession>, TransportError> {
        let stream = TcpStream::connect(destination)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(RtmpSession {
            stream: Some(stream),
            session: None,
            stream_key: self.stream_key.clone(),
        }))
    }

    fn name(&self) -> &str {
        "rtmp"
    }
}

/// One live RTMP connection and the client session state built on it
///
/// The TCP stream stays owned by this handle until `close`, so the
/// underlying connection is released only at teardown, after the hold
/// phase, never while the stream is still held open.
pub struct RtmpSession {
    stream: Option<TcpStream>,
    session: Option<ClientSession>,
    stream_key: String,
}

#[async_trait]
impl MediaSession for RtmpSession {
    async fn handshake(&mut self, app: &str) -> Result<(), TransportError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::Handshake("session already closed".to_string()))?;

        let leftover = exchange_handshake(stream).await?;

        let (mut session, initial_results) = ClientSession::new(ClientSessionConfig::new())
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let mut pending = initial_results;
        if !leftover.is_empty() {
            pending.extend(
                session
                    .handle_input(&leftover)
                    .map_err(|e| TransportError::Handshake(e.to_string()))?,
            );
        }
        pending.push(
            session
                .request_connection(app.to_string())
                .map_err(|e| TransportError::Handshake(e.to_string()))?,
        );

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            for result in std::mem::take(&mut pending) {
                match result {
                    ClientSessionResult::OutboundResponse(packet) => {
                        stream
                            .write_all(&packet.bytes)
                            .await
                            .map_err(|e| TransportError::Handshake(e.to_string()))?;
                    }
                    ClientSessionResult::RaisedEvent(
                        ClientSessionEvent::ConnectionRequestAccepted,
                    ) => {
                        self.session = Some(session);
                        return Ok(());
                    }
                    ClientSessionResult::RaisedEvent(
                        ClientSessionEvent::ConnectionRequestRejected { description },
                    ) => {
                        return Err(TransportError::Handshake(description));
                    }
                    _ => {}
                }
            }

            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| TransportError::Handshake(e.to_string()))?;
            if n == 0 {
                return Err(TransportError::Handshake(
                    "connection closed before connect was acknowledged".to_string(),
                ));
            }
            pending = session
                .handle_input(&buf[..n])
                .map_err(|e| TransportError::Handshake(e.to_string()))?;
        }
    }

    async fn create_stream(&mut self) -> Result<(), TransportError> {
        let stream_key = self.stream_key.clone();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::CreateStream("session already closed".to_string()))?;
        let session = self.session.as_mut().ok_or_else(|| {
            TransportError::CreateStream("handshake has not completed".to_string())
        })?;

        let mut pending = vec![session
            .request_playback(stream_key)
            .map_err(|e| TransportError::CreateStream(e.to_string()))?];

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            for result in std::mem::take(&mut pending) {
                match result {
                    ClientSessionResult::OutboundResponse(packet) => {
                        stream
                            .write_all(&packet.bytes)
                            .await
                            .map_err(|e| TransportError::CreateStream(e.to_string()))?;
                    }
                    ClientSessionResult::RaisedEvent(
                        ClientSessionEvent::PlaybackRequestAccepted,
                    ) => {
                        return Ok(());
                    }
                    _ => {}
                }
            }

            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| TransportError::CreateStream(e.to_string()))?;
            if n == 0 {
                return Err(TransportError::CreateStream(
                    "connection closed before the stream was created".to_string(),
                ));
            }
            pending = session
                .handle_input(&buf[..n])
                .map_err(|e| TransportError::CreateStream(e.to_string()))?;
        }
    }

    async fn close(&mut self) {
        self.session = None;
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

/// Drive the byte-level RTMP handshake to completion
///
/// Returns any bytes that arrived past the handshake boundary; they belong
/// to the client session.
async fn exchange_handshake(stream: &mut TcpStream) -> Result<Vec<u8>, TransportError> {
    let mut handshake = Handshake::new(PeerType::Client);
    let p0_and_p1 = handshake
        .generate_outbound_p0_and_p1()
        .map_err(|e| TransportError::Handshake(e.to_string()))?;
    stream
        .write_all(&p0_and_p1)
        .await
        .map_err(|e| TransportError::Handshake(e.to_string()))?;

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        if n == 0 {
            return Err(TransportError::Handshake(
                "connection closed during handshake".to_string(),
            ));
        }

        match handshake
            .process_bytes(&buf[..n])
            .map_err(|e| TransportError::Handshake(e.to_string()))?
        {
            HandshakeProcessResult::InProgress { response_bytes } => {
                if !response_bytes.is_empty() {
                    stream
                        .write_all(&response_bytes)
                        .await
                        .map_err(|e| TransportError::Handshake(e.to_string()))?;
                }
            }
            HandshakeProcessResult::Completed {
                response_bytes,
                remaining_bytes,
            } => {
                if !response_bytes.is_empty() {
                    stream
                        .write_all(&response_bytes)
                        .await
                        .map_err(|e| TransportError::Handshake(e.to_string()))?;
                }
                return Ok(remaining_bytes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_refused_is_transient() {
        // Bind then drop to find a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = RtmpTransport::new("live");
        let err = transport
            .connect(&addr.to_string())
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, TransportError::Connect(_)));
    }

    #[tokio::test]
    async fn test_handshake_fails_when_peer_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let transport = RtmpTransport::new("live");
        let mut session = transport
            .connect(&addr.to_string())
            .await
            .expect("tcp connect");
        let err = session.handshake("ql").await.unwrap_err();
        assert!(matches!(err, TransportError::Handshake(_)));
        session.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = RtmpTransport::new("live");
        let mut session = transport
            .connect(&addr.to_string())
            .await
            .expect("tcp connect");
        session.close().await;
        session.close().await;

        // Operations after close report an error rather than panicking.
        let err = session.handshake("ql").await.unwrap_err();
        assert!(matches!(err, TransportError::Handshake(_)));
        let err = session.create_stream().await.unwrap_err();
        assert!(matches!(err, TransportError::CreateStream(_)));
    }
}
