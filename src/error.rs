//! Error types for chat-bridge.

use thiserror::Error;

/// Main error type for chat-bridge operations.
#[derive(Error, Debug)]
pub enum ChatBridgeError {
    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Session with the given ID already has a live connection.
    #[error("session already exists: {0}")]
    SessionExists(String),

    /// Session ID failed validation.
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: crate::session::SessionState,
        to: crate::session::SessionState,
    },

    /// The remote side rejected the stored credentials.
    #[error("authentication rejected for session: {0}")]
    AuthInvalid(String),

    /// Credential store I/O failure.
    #[error("credential store error: {0}")]
    Store(#[from] std::io::Error),

    /// Persisted credential material could not be decoded.
    #[error("credential decode error: {0}")]
    CredsDecode(#[from] serde_json::Error),

    /// The external protocol layer failed to open or send.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Recipient address could not be normalized.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Pairing-code wait exceeded.
    #[error("timed out waiting for pairing code")]
    Timeout,

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// Connection event channel closed unexpectedly.
    #[error("event channel closed")]
    ChannelClosed,
}

/// Convenience Result type for chat-bridge operations.
pub type Result<T> = std::result::Result<T, ChatBridgeError>;
