//! API layer for chat-bridge.
//!
//! Translates HTTP requests into session-manager calls.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (unauthenticated)
//! - `POST /session/create` - Start a new session
//! - `GET /session/{id}/qr` - Pairing code as a PNG image
//! - `GET /session/{id}/qr-html` - HTML page embedding the pairing code
//! - `GET /session/{id}/status` - Lifecycle state of a session
//! - `DELETE /session/{id}` - Delete a session and its credentials
//! - `POST /message/send` - Send a text message through a session
//! - `GET /sessions` - List all known sessions
//!
//! All routes except `/health` require a `Authorization: Bearer <token>`
//! header matching a configured API token.

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::AppState;
pub use router::{create_router, serve, ServerConfig};
pub use types::{
    CreateSessionRequest, CreateSessionResponse, DeleteSessionResponse, ErrorResponse,
    ListSessionsResponse, SendMessageRequest, SendMessageResponse, StatusResponse,
};
