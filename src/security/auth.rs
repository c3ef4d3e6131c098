//! Shared-token authentication.
//!
//! Every route except the health check requires a static bearer token,
//! configured through the environment or config file. The token set is
//! mutable at runtime so operators can rotate without a restart.

use std::collections::HashSet;
use std::sync::RwLock;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether authentication is enabled.
    pub enabled: bool,
    /// Prefix for the token value (default: "Bearer ").
    pub prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "Bearer ".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create a disabled auth config (for development).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Thread-safe store of accepted API tokens.
#[derive(Debug)]
pub struct ApiTokenStore {
    tokens: RwLock<HashSet<String>>,
    config: AuthConfig,
}

impl ApiTokenStore {
    /// Create a new token store.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            tokens: RwLock::new(HashSet::new()),
            config,
        }
    }

    /// Create a store with authentication disabled.
    pub fn disabled() -> Self {
        Self::new(AuthConfig::disabled())
    }

    /// Add an accepted token.
    pub fn add_token(&self, token: impl Into<String>) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into());
        }
    }

    /// Remove a token.
    pub fn remove_token(&self, token: &str) -> bool {
        self.tokens
            .write()
            .map(|mut tokens| tokens.remove(token))
            .unwrap_or(false)
    }

    /// Check if a token is accepted.
    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens
            .read()
            .map(|tokens| tokens.contains(token))
            .unwrap_or(false)
    }

    /// Number of accepted tokens.
    pub fn count(&self) -> usize {
        self.tokens.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Check if authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Extract the token value from an authorization header.
    pub fn extract_token(&self, header_value: &str) -> Option<String> {
        header_value
            .strip_prefix(&self.config.prefix)
            .map(str::to_string)
    }
}

impl Default for ApiTokenStore {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

/// Authentication middleware for axum.
pub async fn auth_middleware(
    State(store): State<std::sync::Arc<ApiTokenStore>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Skip auth if disabled
    if !store.is_enabled() {
        return Ok(next.run(request).await);
    }

    // Skip auth for health endpoint
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header) => {
            if let Some(token) = store.extract_token(header) {
                if store.is_valid(&token) {
                    return Ok(next.run(request).await);
                }
            }
            Err(StatusCode::UNAUTHORIZED)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
