//! In-memory session registry.
//!
//! The registry is the authoritative map of session id to lifecycle
//! record. The map itself sits behind a `std::sync::RwLock` that is only
//! held for lookups and insertions; every mutation of a record goes
//! through the slot's `tokio::sync::Mutex`, which serializes API calls
//! and connection-event callbacks per id while letting unrelated
//! sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{SessionId, SessionState};
use crate::creds::CredentialHandle;
use crate::error::ChatBridgeError;
use crate::protocol::Connection;
use crate::Result;

/// Mutable state of one known session.
///
/// Invariants (all maintained under the slot lock): a record in `Closed`
/// holds no connection; at most one live connection exists per id; the
/// generation counter changes whenever the current connection stops
/// being authoritative.
pub struct SessionRecord {
    /// Session this record belongs to.
    pub id: SessionId,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Live connection handle, present only while open or opening.
    pub connection: Option<Arc<dyn Connection>>,
    /// Reference to durable credentials, present once loaded.
    pub creds: Option<CredentialHandle>,
    /// Bumped on every connect and teardown; event pumps compare it to
    /// detect that their stream is stale.
    pub generation: u64,
    /// Event pump task for the current connection.
    pub pump: Option<JoinHandle<()>>,
}

impl SessionRecord {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Closed,
            connection: None,
            creds: None,
            generation: 0,
            pump: None,
        }
    }

    /// Detach the current connection: bump the generation, abort the
    /// event pump, and take the handle out of the record.
    ///
    /// Must happen before closing the handle so an in-flight event
    /// callback cannot mutate a record being torn down.
    pub fn detach(&mut self) -> Option<Arc<dyn Connection>> {
        self.generation = self.generation.wrapping_add(1);
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.connection.take()
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("connection", &self.connection.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

/// One registry entry; the mutex is the per-id serialization point.
#[derive(Debug)]
pub struct SessionSlot {
    pub record: Mutex<SessionRecord>,
}

/// Thread-safe map of session id to slot.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
}

impl SessionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot for `id`, if a record exists.
    pub fn get(&self, id: &SessionId) -> Result<Option<Arc<SessionSlot>>> {
        let slots = self.slots.read().map_err(|_| ChatBridgeError::LockPoisoned)?;
        Ok(slots.get(id).cloned())
    }

    /// Get the slot for `id`, allocating a fresh record if absent.
    pub fn get_or_insert(&self, id: &SessionId) -> Result<Arc<SessionSlot>> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| ChatBridgeError::LockPoisoned)?;
        let slot = slots.entry(id.clone()).or_insert_with(|| {
            Arc::new(SessionSlot {
                record: Mutex::new(SessionRecord::new(id.clone())),
            })
        });
        Ok(Arc::clone(slot))
    }

    /// Remove the record for `id` entirely.
    pub fn remove(&self, id: &SessionId) -> Result<Option<Arc<SessionSlot>>> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| ChatBridgeError::LockPoisoned)?;
        Ok(slots.remove(id))
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        let slots = self.slots.read().map_err(|_| ChatBridgeError::LockPoisoned)?;
        Ok(slots.contains_key(id))
    }

    /// All known session ids, sorted.
    pub fn ids(&self) -> Result<Vec<SessionId>> {
        let slots = self.slots.read().map_err(|_| ChatBridgeError::LockPoisoned)?;
        let mut ids: Vec<SessionId> = slots.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Number of known records.
    pub fn count(&self) -> usize {
        self.slots.read().map(|s| s.len()).unwrap_or(0)
    }
}
