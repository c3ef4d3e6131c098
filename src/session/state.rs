//! Session lifecycle state machine.

/// Lifecycle state of a messaging session's connection.
///
/// A session with no record at all is "unknown"; a deleted session has no
/// record either. Both are represented by absence from the registry rather
/// than by a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Socket opening, awaiting either a pairing code or immediate auth.
    #[default]
    Connecting,
    /// Pairing code issued, not yet scanned.
    AwaitingPairing,
    /// Authenticated, live connection.
    Open,
    /// Explicit teardown in progress.
    Closing,
    /// No live connection; credentials may still exist on disk.
    Closed,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Connecting -> AwaitingPairing | Open | Closing | Closed
    /// - AwaitingPairing -> Open | Closing | Closed
    /// - Open -> Closing | Closed
    /// - Closing -> Closed
    /// - Closed -> Connecting (on-demand reopen)
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Connecting, AwaitingPairing)
                | (Connecting, Open)
                | (Connecting, Closing)
                | (Connecting, Closed)
                | (AwaitingPairing, Open)
                | (AwaitingPairing, Closing)
                | (AwaitingPairing, Closed)
                | (Open, Closing)
                | (Open, Closed)
                | (Closing, Closed)
                | (Closed, Connecting)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::ChatBridgeError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// A live session holds (or is acquiring) a connection; concurrent
    /// creates must be refused while in one of these states.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::AwaitingPairing | SessionState::Open
        )
    }

    /// Check if the session is authenticated and ready to send.
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}
