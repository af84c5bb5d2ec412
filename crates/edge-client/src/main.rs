//! Edge Link client entry point.
//!
//! ```text
//! edge-client <server_host> <server_port> <udp_port> [--work-dir DIR]
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ DatagramEndpoint::bind()  -- UDP socket + standing receiver task
//!  └─ connect()                 -- TCP control channel
//!  └─ run_login()               -- answer prompts, announce UDP port
//!  └─ CommandExecutor::run()    -- console loop until OUT / EOF
//! ```
//!
//! Transfer progress from both directions arrives on an event channel and
//! is printed by its own task, so a file can land while the user is typing.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use edge_client::application::executor::CommandExecutor;
use edge_client::application::login::{run_login, LoginResult};
use edge_client::infrastructure::config::ClientConfig;
use edge_client::infrastructure::console::StdConsole;
use edge_client::infrastructure::network::connect;
use edge_client::infrastructure::transfer::DatagramEndpoint;

#[derive(Debug, Parser)]
#[command(name = "edge-client", version, about = "Edge Link edge device client")]
struct Cli {
    /// Server host name or IP address.
    server_host: String,

    /// Server control-channel TCP port.
    server_port: u16,

    /// Local UDP port for peer-to-peer file transfer.
    udp_port: u16,

    /// Directory for datafiles and received files.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,
}

impl From<Cli> for ClientConfig {
    fn from(cli: Cli) -> Self {
        Self {
            server_host: cli.server_host,
            server_port: cli.server_port,
            udp_port: cli.udp_port,
            work_dir: cli.work_dir,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is the interactive console, so stay quiet unless asked.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from(Cli::parse());

    let (endpoint, mut events) = DatagramEndpoint::bind(config.udp_bind_addr(), config.work_dir.clone())
        .await
        .context("failed to start datagram endpoint")?;
    let udp_port = endpoint
        .local_addr()
        .context("failed to read datagram endpoint address")?
        .port();

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("\n{event}");
        }
    });

    let mut channel = connect(&config).await?;
    let mut console = StdConsole::new();

    let username = match run_login(&mut channel, &mut console, udp_port).await {
        Ok(LoginResult::LoggedIn { username }) => username,
        Ok(LoginResult::Blocked | LoginResult::Abandoned) => return Ok(()),
        Err(e) if e.is_disconnect() => {
            println!("Connection closed by server.");
            return Ok(());
        }
        Err(e) => return Err(e).context("login failed"),
    };

    let sender = endpoint.sender(&username);
    let mut executor = CommandExecutor::new(channel, console, sender, username, config.work_dir);
    match executor.run().await {
        Ok(()) => info!("session ended"),
        Err(e) if e.is_disconnect() => println!("Connection closed by server."),
        Err(e) => {
            warn!("session failed: {e}");
            return Err(e).context("session failed");
        }
    }

    Ok(())
}
