//! Pairing-code tracking.
//!
//! Holds the most recent pairing code per session while a login awaits
//! confirmation. Codes are overwritten by newer ones, cleared on successful
//! authentication and on deletion. No history is kept.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::session::SessionId;

/// Thread-safe store of pending pairing codes, at most one per session.
#[derive(Debug, Default)]
pub struct PairingTracker {
    codes: RwLock<HashMap<SessionId, String>>,
}

impl PairingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pairing code for `id`, replacing any prior value.
    pub fn put(&self, id: &SessionId, code: impl Into<String>) {
        if let Ok(mut codes) = self.codes.write() {
            codes.insert(id.clone(), code.into());
        }
    }

    /// Current pairing code for `id`, if one is pending.
    pub fn get(&self, id: &SessionId) -> Option<String> {
        self.codes
            .read()
            .ok()
            .and_then(|codes| codes.get(id).cloned())
    }

    /// Discard the pairing code for `id`, if any.
    pub fn clear(&self, id: &SessionId) {
        if let Ok(mut codes) = self.codes.write() {
            codes.remove(id);
        }
    }

    /// Number of sessions with a pending code.
    pub fn count(&self) -> usize {
        self.codes.read().map(|c| c.len()).unwrap_or(0)
    }
}
