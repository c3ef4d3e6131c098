//! Durable per-session credential storage.
//!
//! Each session owns one subdirectory under the configured root, holding a
//! `creds.json` document with whatever key material the protocol layer
//! hands us. The document is opaque here: the store persists and erases
//! it, the transport interprets it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::session::SessionId;
use crate::Result;

/// File name of the credential document inside a session directory.
const CREDS_FILE: &str = "creds.json";

/// Filesystem-backed credential store, one directory per session id.
#[derive(Debug, Clone)]
pub struct CredStore {
    root: PathBuf,
}

impl CredStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first `load`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding all session subdirectories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Load or lazily initialize credential material for `id`.
    ///
    /// Creates the session directory and an empty document if absent.
    /// Idempotent.
    pub fn load(&self, id: &SessionId) -> Result<CredentialHandle> {
        let dir = self.session_dir(id);
        fs::create_dir_all(&dir)?;

        let path = dir.join(CREDS_FILE);
        if !path.exists() {
            fs::write(&path, b"{}")?;
        }

        Ok(CredentialHandle {
            id: id.clone(),
            dir,
        })
    }

    /// Persist a credential-rotation event for `id`.
    ///
    /// Called on every `CredsRotated` connection event; rotation is only
    /// durable once this returns.
    pub fn save(&self, id: &SessionId, doc: &Value) -> Result<()> {
        let dir = self.session_dir(id);
        fs::create_dir_all(&dir)?;
        let bytes = serde_json::to_vec_pretty(doc)?;
        fs::write(dir.join(CREDS_FILE), bytes)?;
        Ok(())
    }

    /// Recursively remove the session directory.
    ///
    /// Succeeds if the directory is already gone.
    pub fn erase(&self, id: &SessionId) -> Result<()> {
        let dir = self.session_dir(id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Check whether on-disk state exists for `id`.
    pub fn exists(&self, id: &SessionId) -> bool {
        self.session_dir(id).exists()
    }

    /// List session ids with on-disk state.
    ///
    /// Entries that are not valid session ids (stray files, renamed dirs)
    /// are skipped.
    pub fn list(&self) -> Result<Vec<SessionId>> {
        let mut ids = Vec::new();
        if !self.root.exists() {
            return Ok(ids);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(id) = SessionId::parse(name) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Reference to one session's durable credentials.
///
/// Cheap to clone; reading goes back to disk so a handle never holds stale
/// material across a rotation.
#[derive(Debug, Clone)]
pub struct CredentialHandle {
    id: SessionId,
    dir: PathBuf,
}

impl CredentialHandle {
    /// The session this handle belongs to.
    pub fn session(&self) -> &SessionId {
        &self.id
    }

    /// Directory backing these credentials.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the persisted credential document.
    pub fn read(&self) -> Result<Value> {
        let bytes = fs::read(self.dir.join(CREDS_FILE))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Whether non-empty credential material has been persisted.
    ///
    /// A fresh handle (empty document) still needs to pair via QR; a
    /// registered one can authenticate directly.
    pub fn is_registered(&self) -> bool {
        matches!(self.read(), Ok(Value::Object(map)) if !map.is_empty())
    }
}
