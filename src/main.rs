//! Chat-bridge server entry point.
//!
//! Wires the composition root: credential store, lifecycle manager over
//! the in-process transport, token store, and the HTTP server. Embedding
//! a real protocol client happens through the library API instead
//! (implement [`chat_bridge::Transport`] and hand it to
//! [`chat_bridge::SessionManager`]).

use std::process::ExitCode;
use std::sync::Arc;

use chat_bridge::api::{self, AppState};
use chat_bridge::config::Config;
use chat_bridge::{cli, logging, CredStore, MemoryTransport, SessionManager};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("chat-bridge: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("chat-bridge: {}", err);
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_filter(config.log_filter());
    info!("chat-bridge v{}", env!("CARGO_PKG_VERSION"));

    let store = CredStore::new(config.store.root.clone());
    match store.list() {
        Ok(ids) if !ids.is_empty() => {
            info!("found {} persisted session(s); they reopen on demand", ids.len());
            for id in &ids {
                info!("  persisted session: {}", id);
            }
        }
        Ok(_) => {}
        Err(err) => warn!("could not scan credential store: {}", err),
    }

    let transport = Arc::new(MemoryTransport::new());
    let manager = Arc::new(SessionManager::new(
        transport,
        store,
        config.manager_config(),
    ));

    let tokens = Arc::new(config.token_store());
    if tokens.is_enabled() && tokens.count() == 0 {
        error!("authentication enabled but no API token configured");
        return ExitCode::FAILURE;
    }
    if !tokens.is_enabled() {
        warn!("authentication disabled; every request will be accepted");
    }

    let server_config = match config.server_config() {
        Ok(server_config) => server_config,
        Err(err) => {
            eprintln!("chat-bridge: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(manager);
    if let Err(err) = api::serve(server_config, state, tokens).await {
        error!("server error: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
