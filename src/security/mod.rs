//! Security module for chat-bridge.
//!
//! Provides the shared-token authentication layer guarding the HTTP API.

pub mod auth;

// Re-export commonly used types
pub use auth::{auth_middleware, ApiTokenStore, AuthConfig};
