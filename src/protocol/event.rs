//! Connection event stream types.

use serde_json::Value;

/// Asynchronous event emitted by an open connection.
///
/// Events arrive on a per-connection channel in the order the protocol
/// layer produced them; the session manager consumes them sequentially.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// A pairing code was issued for an unauthenticated login attempt.
    /// Supersedes any previously issued code.
    QrIssued(String),
    /// Authentication succeeded; the connection is live.
    Connected,
    /// The protocol layer rotated its key material; the new document must
    /// be persisted before the rotation is durable.
    CredsRotated(Value),
    /// The remote side closed the connection. `auth_error` means the
    /// stored credentials were rejected and cannot be reused.
    Closed { auth_error: bool },
}

impl ConnectionEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QrIssued(_) => "qr-issued",
            Self::Connected => "connected",
            Self::CredsRotated(_) => "creds-rotated",
            Self::Closed { .. } => "closed",
        }
    }
}
