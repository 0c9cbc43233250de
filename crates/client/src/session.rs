//! Framed SlimProto session
//!
//! The two directions of the TCP connection frame differently: outbound
//! messages are written raw (they carry their own u32 length header inside
//! the frame), inbound messages arrive behind a u16 big-endian length
//! prefix. [`Session`] owns the socket, performs the HELO handshake on
//! connect, and converts between wire frames and typed messages through the
//! protocol codec.
//!
//! A session is single-owner: the `&mut self` receivers enforce that at most
//! one operation runs at a time. Cancellation is drop-based; dropping a
//! `receive` future after it has consumed part of a frame leaves the socket
//! mid-frame, so the session must be disconnected before reuse.

use std::net::SocketAddr;

use bytes::Bytes;
use slimlink_protocol::{codec, ClientMessage, Helo, ProtocolError, ServerMessage, SessionState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::connector::{Connector, TcpConnector};
use crate::error::SessionError;

/// Reason code sent in the BYE! message of a plain disconnect.
pub const BYE_REASON_NORMAL: u8 = 0;

/// A SlimProto session over one TCP connection
///
/// ```no_run
/// use slimlink_client::Session;
/// use slimlink_protocol::Helo;
///
/// # async fn run() -> Result<(), slimlink_client::SessionError> {
/// let mut session = Session::new();
/// session
///     .connect("192.168.1.10:3483".parse().unwrap(), Helo::new(12, 0))
///     .await?;
///
/// let message = session.receive().await?;
/// println!("server says: {message:?}");
///
/// session.disconnect(0).await;
/// # Ok(())
/// # }
/// ```
pub struct Session<C: Connector = TcpConnector> {
    connector: C,
    state: SessionState,
    endpoint: Option<SocketAddr>,
    stream: Option<C::Stream>,
}

impl Session<TcpConnector> {
    /// Creates a disconnected session that will dial over TCP
    pub fn new() -> Self {
        Self::with_connector(TcpConnector)
    }
}

impl Default for Session<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Session<C> {
    /// Creates a disconnected session over a custom connector
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            state: SessionState::default(),
            endpoint: None,
            stream: None,
        }
    }

    /// Connects to a server and performs the HELO handshake
    ///
    /// Any existing connection is torn down first, so calling this on a
    /// connected session reconnects. The helo's capability rendering must be
    /// non-empty; that is checked before any I/O happens.
    pub async fn connect(&mut self, endpoint: SocketAddr, helo: Helo) -> Result<(), SessionError> {
        self.teardown().await;

        if helo.capabilities.render().is_empty() {
            return Err(SessionError::InvalidArgument(
                "capability string is empty".into(),
            ));
        }

        self.state.transition_to(SessionState::Handshaking)?;
        tracing::info!(%endpoint, "connecting to server");

        let stream = match self.connector.connect(endpoint).await {
            Ok(stream) => stream,
            Err(err) => {
                self.state = SessionState::Disconnected;
                return Err(err.into());
            }
        };
        self.stream = Some(stream);
        self.endpoint = Some(endpoint);

        if let Err(err) = self.write_message(&ClientMessage::Helo(helo)).await {
            self.teardown().await;
            return Err(err);
        }

        self.state.transition_to(SessionState::Connected)?;
        tracing::info!(%endpoint, "session established");
        Ok(())
    }

    /// Sends a message to the server
    ///
    /// The frame is flushed before this returns, so messages appear on the
    /// socket in call order. A socket failure tears the session down.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), SessionError> {
        if !self.state.is_connected() {
            return Err(SessionError::NotConnected);
        }
        match self.write_message(message).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.teardown().await;
                Err(err)
            }
        }
    }

    /// Receives the next message from the server
    ///
    /// Reads exactly one length-prefixed frame and decodes it. An
    /// end-of-stream inside a frame surfaces as
    /// [`SessionError::SocketClosed`] and tears the session down; a decode
    /// error leaves the session connected with the frame boundary intact.
    pub async fn receive(&mut self) -> Result<ServerMessage, SessionError> {
        if !self.state.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let payload = match self.read_frame().await {
            Ok(payload) => payload,
            Err(err) => {
                self.teardown().await;
                return Err(err);
            }
        };
        Ok(codec::decode(payload)?)
    }

    /// Disconnects from the server
    ///
    /// Sends a best-effort BYE! with the given reason (failures are logged
    /// and swallowed), then closes the socket. The session can connect
    /// again afterwards.
    pub async fn disconnect(&mut self, reason: u8) {
        if self.state.is_connected() {
            if let Err(err) = self.write_message(&ClientMessage::Bye { reason }).await {
                tracing::warn!(error = %err, "failed to send goodbye");
            }
        }
        self.teardown().await;
        tracing::info!("session closed");
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true if the handshake has completed
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Endpoint of the current or most recent connection
    pub fn endpoint(&self) -> Option<SocketAddr> {
        self.endpoint
    }

    async fn write_message(&mut self, message: &ClientMessage) -> Result<(), SessionError> {
        let frame = codec::encode(message);
        let stream = self.stream.as_mut().ok_or(SessionError::NotConnected)?;
        stream.write_all(&frame).await?;
        stream.flush().await?;
        tracing::debug!(len = frame.len(), "frame sent");
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Bytes, SessionError> {
        let stream = self.stream.as_mut().ok_or(SessionError::NotConnected)?;

        let mut prefix = [0u8; 2];
        stream.read_exact(&mut prefix).await.map_err(map_read_err)?;
        let len = usize::from(u16::from_be_bytes(prefix));
        if len > codec::MAX_FRAME_SIZE {
            return Err(SessionError::Protocol(ProtocolError::Malformed(format!(
                "frame of {len} bytes exceeds the {} byte limit",
                codec::MAX_FRAME_SIZE
            ))));
        }

        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.map_err(map_read_err)?;
        tracing::debug!(len, "frame received");
        Ok(Bytes::from(payload))
    }

    async fn teardown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.state = SessionState::Disconnected;
    }
}

fn map_read_err(err: std::io::Error) -> SessionError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        SessionError::SocketClosed
    } else {
        SessionError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use slimlink_protocol::{Capability, CapabilitySet, ServerMessage};
    use std::io;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::sync::mpsc;

    /// Connector that hands the server half of a fresh pipe to the test on
    /// every connect
    struct PipeConnector {
        server_tx: mpsc::UnboundedSender<DuplexStream>,
    }

    impl PipeConnector {
        fn new() -> (Self, mpsc::UnboundedReceiver<DuplexStream>) {
            let (server_tx, server_rx) = mpsc::unbounded_channel();
            (Self { server_tx }, server_rx)
        }
    }

    #[async_trait]
    impl Connector for PipeConnector {
        type Stream = DuplexStream;

        async fn connect(&self, _endpoint: SocketAddr) -> io::Result<DuplexStream> {
            let (client, server) = tokio::io::duplex(64 * 1024);
            self.server_tx
                .send(server)
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "test server gone"))?;
            Ok(client)
        }
    }

    fn test_endpoint() -> SocketAddr {
        "127.0.0.1:3483".parse().unwrap()
    }

    fn test_helo() -> Helo {
        let mut capabilities = CapabilitySet::new();
        capabilities.add(Capability::Mp3).unwrap();
        Helo {
            capabilities,
            ..Helo::new(12, 0)
        }
    }

    async fn read_client_frame(server: &mut DuplexStream) -> (Vec<u8>, Vec<u8>) {
        let mut opcode = [0u8; 4];
        server.read_exact(&mut opcode).await.unwrap();
        let mut len = [0u8; 4];
        server.read_exact(&mut len).await.unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(len) as usize];
        server.read_exact(&mut payload).await.unwrap();
        (opcode.to_vec(), payload)
    }

    async fn write_server_frame(server: &mut DuplexStream, payload: &[u8]) {
        let prefix = (payload.len() as u16).to_be_bytes();
        server.write_all(&prefix).await.unwrap();
        server.write_all(payload).await.unwrap();
        server.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_sends_helo_first() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);

        session.connect(test_endpoint(), test_helo()).await.unwrap();
        assert!(session.is_connected());
        assert_eq!(session.endpoint(), Some(test_endpoint()));

        let mut server = server_rx.recv().await.unwrap();
        let (opcode, payload) = read_client_frame(&mut server).await;
        assert_eq!(&opcode, b"HELO");
        assert_eq!(&payload[payload.len() - 3..], b"mp3");
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_capabilities_before_io() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);

        let helo = Helo {
            capabilities: CapabilitySet::new(),
            ..Helo::new(12, 0)
        };
        let err = session.connect(test_endpoint(), helo).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
        assert!(!session.is_connected());

        // no socket was opened
        assert!(server_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_before_connect_fails() {
        let (connector, _server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);

        let err = session
            .send(&ClientMessage::Bye { reason: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }

    #[tokio::test]
    async fn test_receive_before_connect_fails() {
        let (connector, _server_rx) = PipeConnector::new();
        let mut session: Session<PipeConnector> = Session::with_connector(connector);

        assert!(matches!(
            session.receive().await,
            Err(SessionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_receive_decodes_framed_message() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut server = server_rx.recv().await.unwrap();

        write_server_frame(&mut server, b"strmq").await;

        assert_eq!(session.receive().await.unwrap(), ServerMessage::Stop);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_receive_reassembles_chunked_frame() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut server = server_rx.recv().await.unwrap();

        // dribble the frame one byte at a time
        let mut wire = Vec::new();
        wire.extend_from_slice(&9u16.to_be_bytes());
        wire.extend_from_slice(b"vers7.9.2");

        let writer = tokio::spawn(async move {
            for byte in wire {
                server.write_all(&[byte]).await.unwrap();
                server.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
            server
        });

        let message = session.receive().await.unwrap();
        assert_eq!(
            message,
            ServerMessage::Version {
                version: "7.9.2".into(),
            }
        );
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_length_frame_yields_unknown() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut server = server_rx.recv().await.unwrap();

        write_server_frame(&mut server, b"").await;

        assert!(matches!(
            session.receive().await.unwrap(),
            ServerMessage::Unknown { opcode, .. } if opcode.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_socket_closed() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut server = server_rx.recv().await.unwrap();

        // length prefix promises 10 bytes, deliver 3, then hang up
        server.write_all(&10u16.to_be_bytes()).await.unwrap();
        server.write_all(b"ver").await.unwrap();
        drop(server);

        let err = session.receive().await.unwrap_err();
        assert!(matches!(err, SessionError::SocketClosed));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_eof_at_frame_boundary_is_socket_closed() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let server = server_rx.recv().await.unwrap();
        drop(server);

        assert!(matches!(
            session.receive().await,
            Err(SessionError::SocketClosed)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_sends_bye() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut server = server_rx.recv().await.unwrap();
        let _ = read_client_frame(&mut server).await; // HELO

        session.disconnect(55).await;
        assert!(!session.is_connected());

        let (opcode, payload) = read_client_frame(&mut server).await;
        assert_eq!(&opcode, b"BYE!");
        assert_eq!(payload, vec![55]);
    }

    #[tokio::test]
    async fn test_disconnect_when_disconnected_is_noop() {
        let (connector, _server_rx) = PipeConnector::new();
        let mut session: Session<PipeConnector> = Session::with_connector(connector);

        session.disconnect(BYE_REASON_NORMAL).await;
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_reconnect_after_disconnect() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);

        session.connect(test_endpoint(), test_helo()).await.unwrap();
        session.disconnect(0).await;
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        assert!(session.is_connected());

        // both connects produced a fresh pipe
        assert!(server_rx.recv().await.is_some());
        assert!(server_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_connect_while_connected_reconnects() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);

        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut first = server_rx.recv().await.unwrap();
        let _ = read_client_frame(&mut first).await;

        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut second = server_rx.recv().await.unwrap();
        let (opcode, _) = read_client_frame(&mut second).await;
        assert_eq!(&opcode, b"HELO");

        // the first pipe saw EOF when the old socket was torn down
        let mut probe = [0u8; 1];
        assert_eq!(first.read(&mut probe).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_messages_sent_in_call_order() {
        let (connector, mut server_rx) = PipeConnector::new();
        let mut session = Session::with_connector(connector);
        session.connect(test_endpoint(), test_helo()).await.unwrap();
        let mut server = server_rx.recv().await.unwrap();
        let _ = read_client_frame(&mut server).await; // HELO

        session
            .send(&ClientMessage::SetName { name: "a".into() })
            .await
            .unwrap();
        session
            .send(&ClientMessage::SetName { name: "b".into() })
            .await
            .unwrap();

        let (_, first) = read_client_frame(&mut server).await;
        let (_, second) = read_client_frame(&mut server).await;
        assert_eq!(first, b"\x00a");
        assert_eq!(second, b"\x00b");
    }
}
