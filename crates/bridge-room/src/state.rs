//! Session state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle of a room session and its dispatch loop.
///
/// `Idle -> Connected -> Draining -> Closed`, with `Faulted` reachable from
/// `Connected` when the dispatch loop fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Not connected yet.
    #[default]
    Idle,

    /// Connected; the dispatch loop is running.
    Connected,

    /// Disconnect requested; the dispatch loop is shutting down.
    Draining,

    /// Disconnected; no more events are delivered.
    Closed,

    /// The dispatch loop failed. Every pending wait was failed.
    Faulted {
        /// What went wrong.
        reason: String,
    },
}

impl SessionState {
    /// Returns true if the session has not connected yet.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if the dispatch loop is running.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true if a disconnect is in progress.
    pub fn is_draining(&self) -> bool {
        matches!(self, Self::Draining)
    }

    /// Returns true if the session ended cleanly.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if the dispatch loop failed.
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted { .. })
    }

    /// Returns true once no further events can be delivered.
    pub fn is_terminal(&self) -> bool {
        self.is_closed() || self.is_faulted()
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connected => "Connected",
            Self::Draining => "Draining",
            Self::Closed => "Closed",
            Self::Faulted { .. } => "Faulted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert!(SessionState::default().is_idle());
    }

    #[test]
    fn test_terminal_states() {
        assert!(SessionState::Closed.is_terminal());
        assert!(SessionState::Faulted {
            reason: "bus closed".into()
        }
        .is_terminal());
        assert!(!SessionState::Draining.is_terminal());
        assert!(!SessionState::Connected.is_terminal());
    }

    #[test]
    fn test_names() {
        assert_eq!(SessionState::Draining.name(), "Draining");
        assert_eq!(
            SessionState::Faulted {
                reason: String::new()
            }
            .name(),
            "Faulted"
        );
    }
}
