//! Configuration management for chat-bridge.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::security::{ApiTokenStore, AuthConfig};
use crate::session::ManagerConfig;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Credential store configuration.
    pub store: StoreSection,
    /// Protocol behavior configuration.
    pub protocol: ProtocolSection,
    /// Security configuration.
    pub security: SecuritySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Credential store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Root directory holding one subdirectory per session.
    pub root: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: "./sessions".to_string(),
        }
    }
}

/// Protocol behavior configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSection {
    /// Domain suffix for bare phone-number recipients.
    pub address_domain: String,
    /// Upper bound in seconds on the pairing-code wait.
    pub qr_wait_secs: u64,
    /// Poll interval in milliseconds while waiting for a pairing code.
    pub qr_poll_ms: u64,
}

impl Default for ProtocolSection {
    fn default() -> Self {
        Self {
            address_domain: crate::protocol::DEFAULT_DOMAIN.to_string(),
            qr_wait_secs: 10,
            qr_poll_ms: 200,
        }
    }
}

/// Security configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Authentication settings.
    pub auth: AuthSection,
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Enable authentication.
    pub enabled: bool,
    /// Accepted API tokens.
    pub api_tokens: Vec<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("CHAT_BRIDGE_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("CHAT_BRIDGE_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(dir) = std::env::var("CHAT_BRIDGE_STORE_DIR") {
            if !dir.is_empty() {
                self.store.root = dir;
            }
        }

        if let Ok(token) = std::env::var("CHAT_BRIDGE_API_TOKEN") {
            if !token.is_empty() {
                self.security.auth.enabled = true;
                if !self.security.auth.api_tokens.contains(&token) {
                    self.security.auth.api_tokens.push(token);
                }
            }
        }

        if let Ok(level) = std::env::var("CHAT_BRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        self.server.host = args.host.to_string();
        self.server.port = args.port;

        if let Some(ref dir) = args.store_dir {
            self.store.root = dir.to_string_lossy().to_string();
        }

        if let Some(ref token) = args.api_token {
            self.security.auth.enabled = true;
            if !self.security.auth.api_tokens.contains(token) {
                self.security.auth.api_tokens.push(token.clone());
            }
        }

        if args.no_auth {
            self.security.auth.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env();

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        Ok(ServerConfig::new(host.to_string(), self.server.port))
    }

    /// Convert to ManagerConfig for the session lifecycle manager.
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            address_domain: self.protocol.address_domain.clone(),
            qr_wait: Duration::from_secs(self.protocol.qr_wait_secs),
            qr_poll: Duration::from_millis(self.protocol.qr_poll_ms.max(1)),
        }
    }

    /// Build the API token store from the security section.
    pub fn token_store(&self) -> ApiTokenStore {
        let store = ApiTokenStore::new(AuthConfig {
            enabled: self.security.auth.enabled,
            ..AuthConfig::default()
        });
        for token in &self.security.auth.api_tokens {
            store.add_token(token);
        }
        store
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
        }
    }
}

impl std::error::Error for ConfigError {}
