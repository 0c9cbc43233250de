use slimlink_protocol::ProtocolError;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not connected")]
    NotConnected,

    #[error("socket closed by peer")]
    SocketClosed,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
