//! keyspan - A Redis-Compatible Server over an Ordered Key-Value Store
//!
//! This is the main entry point for the keyspan server.
//! It opens the store, sets up the TCP listener and handles incoming
//! connections.

use anyhow::Context;
use clap::Parser;
use keyspan::commands::CommandExecutor;
use keyspan::config::ServerConfig;
use keyspan::connection::{handle_connection, ConnectionStats};
use keyspan::storage::{MemoryStore, RedbStore, Store};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &ServerConfig) {
    let storage = if config.in_memory {
        "in-memory".to_string()
    } else {
        config.data.display().to_string()
    };
    println!(
        r#"
keyspan v{} - Redis-Compatible Server over an Ordered Key-Value Store
──────────────────────────────────────────────────────────────────────
Server started on {}
Storage: {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        keyspan::VERSION,
        config.bind_address(),
        storage
    );
}

/// Opens the store selected on the command line.
fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.in_memory {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = RedbStore::open(&config.data)
        .with_context(|| format!("failed to open database {}", config.data.display()))?;
    info!(path = %config.data.display(), "Opened database");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    // Set up logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    print_banner(&config);

    let store = open_store(&config)?;
    let executor_config = config.executor_config();
    if executor_config.read_only {
        info!("Read-only mode: write commands will be rejected");
    }
    if executor_config.no_sync {
        warn!("Durable writes disabled: recent writes may be lost on a crash");
    }
    let executor = Arc::new(CommandExecutor::new(store, executor_config));

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    };

    tokio::select! {
        _ = accept_loop(listener, executor, stats) => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    executor: Arc<CommandExecutor>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let executor = Arc::clone(&executor);
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, executor, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
