//! Transport seam for the session
//!
//! The session never dials a socket itself; it asks a [`Connector`] for a
//! byte stream. Production code uses [`TcpConnector`], tests substitute a
//! connector handing out in-memory duplex pipes so a fake server can sit on
//! the other end without any networking.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Factory for the byte streams a session runs over
///
/// # Example: a test connector over in-memory pipes
///
/// ```no_run
/// use async_trait::async_trait;
/// use slimlink_client::Connector;
/// use std::io;
/// use std::net::SocketAddr;
/// use tokio::io::DuplexStream;
///
/// struct PipeConnector {
///     // hands the server half to the test on every connect
/// }
///
/// #[async_trait]
/// impl Connector for PipeConnector {
///     type Stream = DuplexStream;
///
///     async fn connect(&self, _endpoint: SocketAddr) -> io::Result<DuplexStream> {
///         let (client, _server) = tokio::io::duplex(4096);
///         Ok(client)
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Byte stream this connector produces
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Opens a fresh stream to the given endpoint
    async fn connect(&self, endpoint: SocketAddr) -> io::Result<Self::Stream>;
}

/// Connects sessions over plain TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, endpoint: SocketAddr) -> io::Result<TcpStream> {
        TcpStream::connect(endpoint).await
    }
}
