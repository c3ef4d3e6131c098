//! External protocol boundary.
//!
//! The wire protocol itself (handshake, encryption, framing) lives outside
//! this crate. Everything the session layer needs from it is captured by
//! the [`Transport`] and [`Connection`] traits plus the [`ConnectionEvent`]
//! stream; [`memory::MemoryTransport`] is an in-process implementation used
//! by the dev server and the test-suite.

pub mod address;
pub mod event;
pub mod memory;
pub mod transport;

// Re-export commonly used types
pub use address::{normalize_recipient, DEFAULT_DOMAIN};
pub use event::ConnectionEvent;
pub use memory::{MemoryBehavior, MemoryTransport};
pub use transport::{Connection, SendReceipt, Transport};
