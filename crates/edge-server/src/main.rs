//! Edge Link server entry point.
//!
//! ```text
//! edge-server <port> <max_login_attempts> [--config server.toml]
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()           -- optional TOML, defaults otherwise
//!  └─ ServerState::from_config -- credentials, logs, datafiles, BlockedSet
//!  └─ run_server()            -- accept loop
//!       └─ supervise()        -- one Tokio task per connection
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use edge_server::infrastructure::network::server::run_server;
use edge_server::infrastructure::storage::config::load_config;
use edge_server::ServerState;

#[derive(Debug, Parser)]
#[command(name = "edge-server", version, about = "Edge Link control server")]
struct Cli {
    /// TCP port for the control channel.
    port: u16,

    /// Wrong passwords allowed per connection before the account is blocked.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    max_login_attempts: u32,

    /// Optional TOML settings file (file locations, lockout duration).
    #[arg(long, env = "EDGE_SERVER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load server config")?;

    let ip: IpAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.bind_address))?;
    let bind = SocketAddr::new(ip, cli.port);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind control listener on {bind}"))?;

    let state = Arc::new(ServerState::from_config(&config, cli.max_login_attempts));
    info!(
        max_login_attempts = cli.max_login_attempts,
        lockout_secs = config.lockout_secs,
        "Edge Link server starting"
    );

    // Shutdown flag shared with the accept loop.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    run_server(listener, state, running).await;

    info!("Edge Link server stopped");
    Ok(())
}
