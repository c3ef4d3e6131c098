//! # chat-bridge
//!
//! Multi-tenant session gateway for WhatsApp-style messaging networks.
//!
//! Each session represents one logged-in device identity with its own
//! persisted credentials, connection lifecycle, and pending pairing
//! state. The crate keeps on-disk credential state, in-memory connection
//! handles, and pairing codes consistent under concurrent HTTP requests
//! and asynchronous network events.
//!
//! ## Features
//!
//! - **Session lifecycle**: create, pair via QR, reopen on demand,
//!   delete — with per-session serialization of API calls and
//!   connection events
//! - **Durable credentials**: one directory per session, erased when
//!   the remote side rejects them
//! - **Pluggable transport**: the wire protocol lives behind the
//!   [`protocol::Transport`] trait
//! - **HTTP API**: token-authenticated axum surface for session and
//!   message operations
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_bridge::{CredStore, ManagerConfig, MemoryTransport, SessionId, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> chat_bridge::Result<()> {
//!     // Initialize logging
//!     chat_bridge::logging::try_init().ok();
//!
//!     // Compose the lifecycle manager over an in-process transport
//!     let transport = Arc::new(MemoryTransport::new());
//!     let manager = SessionManager::new(
//!         transport,
//!         CredStore::new("./sessions"),
//!         ManagerConfig::default(),
//!     );
//!
//!     // Start a session; the pairing code arrives via the event stream
//!     let id = SessionId::parse("tenant-a")?;
//!     manager.create(&id).await?;
//!     if let Some(code) = manager.qr_code(&id).await? {
//!         println!("scan to pair: {}", code);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod creds;
pub mod error;
pub mod logging;
pub mod pairing;
pub mod protocol;
pub mod security;
pub mod session;

// Re-export commonly used types
pub use creds::{CredStore, CredentialHandle};
pub use error::{ChatBridgeError, Result};
pub use pairing::PairingTracker;
pub use protocol::{
    Connection, ConnectionEvent, MemoryBehavior, MemoryTransport, SendReceipt, Transport,
};
pub use session::{
    ManagerConfig, SessionId, SessionManager, SessionRegistry, SessionState, SessionStatus,
};
