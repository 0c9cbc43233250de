use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("truncated input: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: crate::state::SessionState,
        to: crate::state::SessionState,
    },
}

/// Result type for protocol-level operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
