//! In-process transport implementation.
//!
//! Stands in for a real protocol client during development and in the
//! test-suite: connections succeed instantly, unregistered credentials
//! get a generated pairing code, registered ones authenticate right away.
//! Tests can inject arbitrary events to simulate remote behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;

use crate::creds::CredentialHandle;
use crate::error::ChatBridgeError;
use crate::session::SessionId;
use crate::Result;

use super::event::ConnectionEvent;
use super::transport::{Connection, SendReceipt, Transport};

/// Scripted behavior for a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryBehavior {
    /// Emit a generated pairing code when credentials are unregistered.
    pub emit_qr: bool,
    /// Delay before the pairing code is emitted.
    pub qr_delay: Duration,
    /// Emit `Connected` immediately when credentials are registered.
    pub connect_registered: bool,
    /// Fail every connection attempt.
    pub fail_connect: bool,
    /// Fail every send.
    pub fail_send: bool,
}

impl Default for MemoryBehavior {
    fn default() -> Self {
        Self {
            emit_qr: true,
            qr_delay: Duration::ZERO,
            connect_registered: true,
            fail_connect: false,
            fail_send: false,
        }
    }
}

impl MemoryBehavior {
    /// Behavior that never emits anything on its own; tests drive every
    /// event through [`MemoryTransport::emit`].
    pub fn silent() -> Self {
        Self {
            emit_qr: false,
            connect_registered: false,
            ..Default::default()
        }
    }
}

type Outbox = Arc<Mutex<Vec<(SessionId, String, String)>>>;

/// In-process [`Transport`] with scriptable behavior.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    behavior: MemoryBehavior,
    connects: AtomicUsize,
    links: RwLock<HashMap<SessionId, mpsc::Sender<ConnectionEvent>>>,
    outbox: Outbox,
}

impl MemoryTransport {
    /// Transport with default behavior (instant QR, instant auth for
    /// registered credentials).
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with custom behavior.
    pub fn with_behavior(behavior: MemoryBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    /// Number of connection attempts seen so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Inject an event into the most recent connection for `id`.
    ///
    /// Returns `false` if the session never connected or its event
    /// channel is gone.
    pub async fn emit(&self, id: &SessionId, event: ConnectionEvent) -> bool {
        let sender = self
            .links
            .read()
            .ok()
            .and_then(|links| links.get(id).cloned());
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Messages accepted for delivery, in send order.
    pub fn sent(&self) -> Vec<(SessionId, String, String)> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(
        &self,
        id: &SessionId,
        creds: CredentialHandle,
    ) -> Result<(Arc<dyn Connection>, mpsc::Receiver<ConnectionEvent>)> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if self.behavior.fail_connect {
            return Err(ChatBridgeError::Protocol(format!(
                "connection refused for {}",
                id
            )));
        }

        let (tx, rx) = mpsc::channel(16);
        if let Ok(mut links) = self.links.write() {
            links.insert(id.clone(), tx.clone());
        }

        let registered = creds.is_registered();
        let behavior = self.behavior.clone();
        tokio::spawn(async move {
            if registered && behavior.connect_registered {
                let _ = tx.send(ConnectionEvent::Connected).await;
            } else if behavior.emit_qr {
                if !behavior.qr_delay.is_zero() {
                    tokio::time::sleep(behavior.qr_delay).await;
                }
                let _ = tx.send(ConnectionEvent::QrIssued(pairing_code())).await;
            }
        });

        let conn = MemoryConnection {
            id: id.clone(),
            fail_send: self.behavior.fail_send,
            closed: AtomicBool::new(false),
            outbox: Arc::clone(&self.outbox),
        };

        Ok((Arc::new(conn), rx))
    }
}

struct MemoryConnection {
    id: SessionId,
    fail_send: bool,
    closed: AtomicBool,
    outbox: Outbox,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&self, recipient: &str, text: &str) -> Result<SendReceipt> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChatBridgeError::Protocol("connection closed".into()));
        }
        if self.fail_send {
            return Err(ChatBridgeError::Protocol("send rejected".into()));
        }

        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push((self.id.clone(), recipient.to_string(), text.to_string()));
        }

        Ok(SendReceipt {
            message_id: message_id(),
        })
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Generates a pairing code in the `2@<token>` shape the real network
/// uses for QR payloads.
fn pairing_code() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("2@{}", token)
}

/// Generates an uppercase hex message id.
fn message_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
    format!("3EB0{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn handle(tmp: &TempDir, raw: &str) -> CredentialHandle {
        let store = crate::creds::CredStore::new(tmp.path());
        store.load(&SessionId::parse(raw).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_unregistered_creds_get_qr() {
        let tmp = TempDir::new().unwrap();
        let transport = MemoryTransport::new();
        let id = SessionId::parse("fresh").unwrap();

        let (_conn, mut rx) = transport.connect(&id, handle(&tmp, "fresh")).await.unwrap();

        match rx.recv().await {
            Some(ConnectionEvent::QrIssued(code)) => assert!(code.starts_with("2@")),
            other => panic!("expected QrIssued, got {:?}", other),
        }
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_registered_creds_connect_directly() {
        let tmp = TempDir::new().unwrap();
        let store = crate::creds::CredStore::new(tmp.path());
        let id = SessionId::parse("known").unwrap();
        let creds = store.load(&id).unwrap();
        store
            .save(&id, &serde_json::json!({"noise_key": "k"}))
            .unwrap();

        let transport = MemoryTransport::new();
        let (_conn, mut rx) = transport.connect(&id, creds).await.unwrap();

        assert!(matches!(rx.recv().await, Some(ConnectionEvent::Connected)));
    }

    #[tokio::test]
    async fn test_send_records_and_receipts() {
        let tmp = TempDir::new().unwrap();
        let transport = MemoryTransport::with_behavior(MemoryBehavior::silent());
        let id = SessionId::parse("sender").unwrap();

        let (conn, _rx) = transport.connect(&id, handle(&tmp, "sender")).await.unwrap();
        let receipt = conn.send("15551234567@s.whatsapp.net", "hi").await.unwrap();

        assert!(receipt.message_id.starts_with("3EB0"));
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "15551234567@s.whatsapp.net");
        assert_eq!(sent[0].2, "hi");
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let tmp = TempDir::new().unwrap();
        let transport = MemoryTransport::with_behavior(MemoryBehavior::silent());
        let id = SessionId::parse("closer").unwrap();

        let (conn, _rx) = transport.connect(&id, handle(&tmp, "closer")).await.unwrap();
        conn.close().await;

        assert!(conn.send("1@s.whatsapp.net", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_emit_reaches_receiver() {
        let tmp = TempDir::new().unwrap();
        let transport = MemoryTransport::with_behavior(MemoryBehavior::silent());
        let id = SessionId::parse("driven").unwrap();

        let (_conn, mut rx) = transport.connect(&id, handle(&tmp, "driven")).await.unwrap();
        assert!(
            transport
                .emit(&id, ConnectionEvent::Closed { auth_error: false })
                .await
        );
        assert!(matches!(
            rx.recv().await,
            Some(ConnectionEvent::Closed { auth_error: false })
        ));
    }

    #[tokio::test]
    async fn test_emit_unknown_session() {
        let transport = MemoryTransport::new();
        let id = SessionId::parse("nobody").unwrap();
        assert!(!transport.emit(&id, ConnectionEvent::Connected).await);
    }

    #[tokio::test]
    async fn test_fail_connect() {
        let tmp = TempDir::new().unwrap();
        let transport = MemoryTransport::with_behavior(MemoryBehavior {
            fail_connect: true,
            ..Default::default()
        });
        let id = SessionId::parse("refused").unwrap();

        let result = transport.connect(&id, handle(&tmp, "refused")).await;
        assert!(matches!(result, Err(ChatBridgeError::Protocol(_))));
        assert_eq!(transport.connect_count(), 1);
    }
}
