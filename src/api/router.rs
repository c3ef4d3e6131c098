//! API router configuration.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_session, delete_session, get_qr, get_qr_html, get_status, health, list_sessions,
    send_message, AppState,
};
use crate::security::{auth_middleware, ApiTokenStore};

/// Create the API router with the given state and token store.
pub fn create_router(state: AppState, tokens: Arc<ApiTokenStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/create", post(create_session))
        .route("/session/{id}/qr", get(get_qr))
        .route("/session/{id}/qr-html", get(get_qr_html))
        .route("/session/{id}/status", get(get_status))
        .route("/session/{id}", delete(delete_session))
        .route("/message/send", post(send_message))
        .route("/sessions", get(list_sessions))
        .layer(middleware::from_fn_with_state(tokens, auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Start the API server, running until ctrl-c.
pub async fn serve(
    config: ServerConfig,
    state: AppState,
    tokens: Arc<ApiTokenStore>,
) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router(state, tokens);

    tracing::info!("Starting chat-bridge API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(crate::error::ChatBridgeError::Store)?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| crate::error::ChatBridgeError::Store(std::io::Error::other(e.to_string())))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_server_config_custom() {
        let config = ServerConfig::new("0.0.0.0", 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }
}
