//! Transport and connection traits.
//!
//! These traits are the seam between the session layer and the external
//! messaging protocol. Implement [`Transport`] to plug in a real protocol
//! client; the crate ships [`crate::protocol::MemoryTransport`] for
//! development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::creds::CredentialHandle;
use crate::session::SessionId;
use crate::Result;

use super::event::ConnectionEvent;

/// Acknowledgement returned by the protocol layer for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Protocol-assigned message identifier.
    pub message_id: String,
}

/// One live connection to the messaging network.
///
/// Opaque to the session layer except for sending and closing; state
/// changes arrive through the event channel handed out at connect time.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send a text message to an already-normalized recipient address.
    async fn send(&self, recipient: &str, text: &str) -> Result<SendReceipt>;

    /// Close the connection. Idempotent; must not emit further events
    /// after returning.
    async fn close(&self);
}

/// Factory for protocol connections.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection for `id` using its persisted credentials.
    ///
    /// Returns the connection handle and the event stream for its
    /// lifetime. The receiver closing is equivalent to a non-auth-error
    /// remote close.
    async fn connect(
        &self,
        id: &SessionId,
        creds: CredentialHandle,
    ) -> Result<(Arc<dyn Connection>, mpsc::Receiver<ConnectionEvent>)>;
}
