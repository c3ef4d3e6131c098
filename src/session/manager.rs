//! Session lifecycle manager.
//!
//! Orchestrates creation, authentication events, on-demand reopening for
//! outbound sends, and deletion of per-tenant protocol connections,
//! keeping the registry, pairing tracker, and credential store consistent
//! under concurrent API calls and asynchronous connection events.
//!
//! Policy decisions baked in here: connections stay open after a
//! successful send or QR fetch; a remote close leaves the record in
//! `Closed` and the next operation that needs a live connection reopens
//! it — there is no background reconnect loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::creds::CredStore;
use crate::error::ChatBridgeError;
use crate::pairing::PairingTracker;
use crate::protocol::{normalize_recipient, Connection, ConnectionEvent, SendReceipt, Transport};
use crate::Result;

use super::registry::{SessionRecord, SessionRegistry, SessionSlot};
use super::{SessionId, SessionState};

/// Tunables for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Domain suffix appended to bare phone-number recipients.
    pub address_domain: String,
    /// Upper bound on how long `qr_code` waits for a pairing code.
    pub qr_wait: Duration,
    /// Poll interval while waiting for a pairing code.
    pub qr_poll: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            address_domain: crate::protocol::DEFAULT_DOMAIN.to_string(),
            qr_wait: Duration::from_secs(10),
            qr_poll: Duration::from_millis(200),
        }
    }
}

/// Snapshot of one session's lifecycle state.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub id: SessionId,
    pub state: SessionState,
    pub connected: bool,
}

/// The session lifecycle manager.
///
/// Owns the registry and pairing tracker; the credential store and the
/// transport are injected by the composition root, so tests can stand up
/// fully independent instances.
pub struct SessionManager {
    registry: SessionRegistry,
    pairing: Arc<PairingTracker>,
    creds: CredStore,
    transport: Arc<dyn Transport>,
    config: ManagerConfig,
}

impl SessionManager {
    /// Create a manager over the given transport and credential store.
    pub fn new(transport: Arc<dyn Transport>, creds: CredStore, config: ManagerConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            pairing: Arc::new(PairingTracker::new()),
            creds,
            transport,
            config,
        }
    }

    /// The credential store this manager persists into.
    pub fn creds(&self) -> &CredStore {
        &self.creds
    }

    /// Start a new session for `id`.
    ///
    /// Fails with `SessionExists` if a live record already exists.
    /// Returns once the connection attempt has been initiated; it does
    /// not wait for authentication.
    pub async fn create(&self, id: &SessionId) -> Result<()> {
        let slot = self.registry.get_or_insert(id)?;
        let mut record = slot.record.lock().await;

        if record.state.is_live() {
            return Err(ChatBridgeError::SessionExists(id.to_string()));
        }

        self.open_locked(&slot, &mut record).await?;
        Ok(())
    }

    /// Return the live connection for `id`, opening one if needed.
    ///
    /// All concurrent callers for the same id serialize on the slot lock
    /// and observe a single connection-open attempt.
    pub async fn get_or_create(&self, id: &SessionId) -> Result<Arc<dyn Connection>> {
        let slot = self.registry.get_or_insert(id)?;
        let mut record = slot.record.lock().await;

        if record.state.is_live() {
            if let Some(conn) = record.connection.clone() {
                return Ok(conn);
            }
        }

        self.open_locked(&slot, &mut record).await
    }

    /// Send a text message through `id`'s connection, reopening it on
    /// demand.
    ///
    /// The recipient is normalized into the protocol's addressing form
    /// first. If opening or sending fails, the session is closed before
    /// the error is surfaced, so a failed send never leaks a half-open
    /// connection.
    pub async fn send_message(
        &self,
        id: &SessionId,
        to: &str,
        text: &str,
    ) -> Result<SendReceipt> {
        let recipient = normalize_recipient(to, &self.config.address_domain)?;

        let result = async {
            let conn = self.get_or_create(id).await?;
            conn.send(&recipient, text).await
        }
        .await;

        if let Err(ref err) = result {
            tracing::warn!(%id, %err, "send failed, closing session");
            self.close(id).await;
        }
        result
    }

    /// Current pairing code for `id`, waiting up to the configured bound
    /// for one to arrive.
    ///
    /// Creates the session on demand if no record exists. Returns `None`
    /// when no code shows up within the wait, or when the session
    /// authenticates without needing one.
    pub async fn qr_code(&self, id: &SessionId) -> Result<Option<String>> {
        if let Some(code) = self.pairing.get(id) {
            return Ok(Some(code));
        }

        self.get_or_create(id).await?;

        let deadline = tokio::time::Instant::now() + self.config.qr_wait;
        loop {
            if let Some(code) = self.pairing.get(id) {
                return Ok(Some(code));
            }

            // An already-authenticated session will never issue a code.
            if let Some(slot) = self.registry.get(id)? {
                let record = slot.record.lock().await;
                if record.state.is_connected() {
                    return Ok(None);
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.config.qr_poll).await;
        }
    }

    /// Lifecycle snapshot for `id`.
    pub async fn status(&self, id: &SessionId) -> Result<SessionStatus> {
        let slot = self
            .registry
            .get(id)?
            .ok_or_else(|| ChatBridgeError::SessionNotFound(id.to_string()))?;
        let record = slot.record.lock().await;

        Ok(SessionStatus {
            id: id.clone(),
            state: record.state,
            connected: record.state.is_connected(),
        })
    }

    /// All ids with a known record, in any state.
    pub fn list(&self) -> Result<Vec<SessionId>> {
        self.registry.ids()
    }

    /// Tear down `id`'s connection but keep its record and credentials.
    ///
    /// Best effort; a session without a record is a no-op.
    pub async fn close(&self, id: &SessionId) {
        let Ok(Some(slot)) = self.registry.get(id) else {
            return;
        };
        let mut record = slot.record.lock().await;
        let conn = record.detach();
        settle_closed(&mut record);
        self.pairing.clear(id);

        if let Some(conn) = conn {
            conn.close().await;
            tracing::debug!(%id, "connection closed");
        }
    }

    /// Delete `id` entirely: close any live connection, drop the record,
    /// and erase the credential directory.
    ///
    /// Fails with `SessionNotFound` only when neither a record nor
    /// on-disk state exists. A filesystem failure after the in-memory
    /// cleanup surfaces as `Store` without undoing that cleanup.
    pub async fn delete(&self, id: &SessionId) -> Result<()> {
        let had_record = match self.registry.get(id)? {
            Some(slot) => {
                let mut record = slot.record.lock().await;
                let conn = record.detach();
                settle_closed(&mut record);
                record.creds = None;
                if let Some(conn) = conn {
                    conn.close().await;
                }
                drop(record);
                self.registry.remove(id)?;
                true
            }
            None => false,
        };

        self.pairing.clear(id);

        if !had_record && !self.creds.exists(id) {
            return Err(ChatBridgeError::SessionNotFound(id.to_string()));
        }

        self.creds.erase(id)?;
        tracing::info!(%id, "session deleted");
        Ok(())
    }

    /// Open a connection for the locked record and spawn its event pump.
    ///
    /// The caller holds the slot lock; the record must not be live.
    async fn open_locked(
        &self,
        slot: &Arc<SessionSlot>,
        record: &mut SessionRecord,
    ) -> Result<Arc<dyn Connection>> {
        let id = record.id.clone();

        // Blocking filesystem work happens under this id's lock only,
        // never under the registry map lock.
        let handle = self.creds.load(&id)?;
        let (conn, events) = self.transport.connect(&id, handle.clone()).await?;

        record.creds = Some(handle);
        record.generation = record.generation.wrapping_add(1);
        record.state.transition_to(SessionState::Connecting)?;
        record.connection = Some(conn.clone());

        record.pump = Some(tokio::spawn(pump_events(
            id.clone(),
            record.generation,
            Arc::clone(slot),
            events,
            Arc::clone(&self.pairing),
            self.creds.clone(),
        )));

        tracing::info!(%id, "connection attempt started");
        Ok(conn)
    }
}

/// Force a record into `Closed`, going through `Closing` when the state
/// machine requires it.
fn settle_closed(record: &mut SessionRecord) {
    if record.state == SessionState::Closed {
        return;
    }
    if record.state.can_transition_to(SessionState::Closing) {
        let _ = record.state.transition_to(SessionState::Closing);
    }
    let _ = record.state.transition_to(SessionState::Closed);
}

/// Per-connection event pump.
///
/// Consumes the connection's event stream sequentially, taking the slot
/// lock before each mutation. The generation check turns a stale pump —
/// one whose connection was detached by a reopen or delete — into a
/// no-op instead of a race.
async fn pump_events(
    id: SessionId,
    generation: u64,
    slot: Arc<SessionSlot>,
    mut events: mpsc::Receiver<ConnectionEvent>,
    pairing: Arc<PairingTracker>,
    creds: CredStore,
) {
    while let Some(event) = events.recv().await {
        let mut record = slot.record.lock().await;
        if record.generation != generation {
            return;
        }
        tracing::debug!(%id, kind = event.kind(), "connection event");

        match event {
            ConnectionEvent::QrIssued(code) => {
                pairing.put(&id, code);
                if record.state == SessionState::Connecting {
                    let _ = record.state.transition_to(SessionState::AwaitingPairing);
                }
            }
            ConnectionEvent::Connected => {
                pairing.clear(&id);
                if let Err(err) = record.state.transition_to(SessionState::Open) {
                    tracing::warn!(%id, %err, "ignoring auth event");
                } else {
                    tracing::info!(%id, "session authenticated");
                }
            }
            ConnectionEvent::CredsRotated(doc) => {
                if let Err(err) = creds.save(&id, &doc) {
                    tracing::error!(%id, %err, "failed to persist rotated credentials");
                }
            }
            ConnectionEvent::Closed { auth_error } => {
                tracing::info!(%id, auth_error, "remote closed connection");
                handle_remote_close(&mut record, &id, &pairing, &creds, auth_error);
                return;
            }
        }
    }

    // Event channel dropped without an explicit close: same handling as
    // a plain remote close.
    let mut record = slot.record.lock().await;
    if record.generation != generation {
        return;
    }
    handle_remote_close(&mut record, &id, &pairing, &creds, false);
}

fn handle_remote_close(
    record: &mut SessionRecord,
    id: &SessionId,
    pairing: &PairingTracker,
    creds: &CredStore,
    auth_error: bool,
) {
    pairing.clear(id);
    record.connection = None;
    record.pump = None;
    record.generation = record.generation.wrapping_add(1);
    settle_closed(record);

    if auth_error {
        // Rejected credentials cannot be reused; the next create pairs
        // from scratch.
        record.creds = None;
        if let Err(err) = creds.erase(id) {
            tracing::error!(%id, %err, "failed to erase credentials after auth failure");
        }
    }
}
