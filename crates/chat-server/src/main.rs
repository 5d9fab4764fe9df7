//! Presence and chat relay server.

use chat_server::config::Config;
use chat_server::server;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chat-server")]
#[command(about = "Presence directory and chat relay over TCP")]
struct Cli {
    /// Interface to bind (overrides CHAT_BIND_ADDR)
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides CHAT_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!(
        addr = %config.socket_addr_string(),
        max_clients = config.max_clients,
        verify_identity = config.jwt_secret.is_some(),
        "starting chat-server"
    );

    tokio::select! {
        res = server::run(config) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            Ok(())
        }
    }
}
