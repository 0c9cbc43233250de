//! Session lifecycle state machine
//!
//! State transitions:
//! ```text
//! Disconnected ──connect──▶ Handshaking ──HELO sent──▶ Connected
//!      ▲                         │                          │
//!      └─────────────────────────┴──────────────────────────┘
//!                  (disconnect / socket error)
//! ```

use crate::error::{ProtocolError, Result};

/// Lifecycle state of a SlimProto session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connection established
    #[default]
    Disconnected,

    /// TCP connection being opened, HELO not yet on the wire
    Handshaking,

    /// HELO sent, session fully established
    Connected,
}

impl SessionState {
    /// Validates a state transition
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Disconnected, Handshaking) => true,

            (Handshaking, Connected) => true,    // HELO written
            (Handshaking, Disconnected) => true, // dial or handshake failed

            (Connected, Disconnected) => true, // disconnect or socket error

            // Any state can stay in same state
            (a, b) if a == &b => true,

            _ => false,
        }
    }

    /// Attempts to transition to a new state
    ///
    /// Returns Ok(()) if transition is valid, Err otherwise
    pub fn transition_to(&mut self, next: SessionState) -> Result<()> {
        if self.can_transition_to(next) {
            *self = next;
            Ok(())
        } else {
            Err(ProtocolError::InvalidStateTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Returns true if the session is fully established
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// Returns true if no connection is open
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, SessionState::Disconnected)
    }

    /// Returns true if the handshake is still in flight
    #[inline]
    pub fn is_handshaking(&self) -> bool {
        matches!(self, SessionState::Handshaking)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Handshaking => write!(f, "Handshaking"),
            SessionState::Connected => write!(f, "Connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let mut state = SessionState::Disconnected;

        assert!(state.transition_to(SessionState::Handshaking).is_ok());
        assert_eq!(state, SessionState::Handshaking);

        assert!(state.transition_to(SessionState::Connected).is_ok());
        assert_eq!(state, SessionState::Connected);

        assert!(state.transition_to(SessionState::Disconnected).is_ok());
        assert_eq!(state, SessionState::Disconnected);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut state = SessionState::Disconnected;

        // Disconnected → Connected (skip handshake)
        assert!(state.transition_to(SessionState::Connected).is_err());
        assert_eq!(state, SessionState::Disconnected); // state unchanged

        state = SessionState::Connected;
        assert!(state.transition_to(SessionState::Handshaking).is_err());
    }

    #[test]
    fn test_handshake_failure_recovery() {
        let mut state = SessionState::Handshaking;

        assert!(state.transition_to(SessionState::Disconnected).is_ok());
        assert_eq!(state, SessionState::Disconnected);
    }

    #[test]
    fn test_same_state_is_allowed() {
        let mut state = SessionState::Connected;
        assert!(state.transition_to(SessionState::Connected).is_ok());
    }

    #[test]
    fn test_state_predicates() {
        assert!(SessionState::Disconnected.is_disconnected());
        assert!(SessionState::Handshaking.is_handshaking());
        assert!(SessionState::Connected.is_connected());
        assert!(!SessionState::Handshaking.is_connected());
    }

    #[test]
    fn test_default() {
        assert_eq!(SessionState::default(), SessionState::Disconnected);
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(SessionState::Handshaking.to_string(), "Handshaking");
        assert_eq!(SessionState::Connected.to_string(), "Connected");
    }
}
