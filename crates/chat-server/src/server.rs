//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections, up to `max_clients` at a time.
//! - Assigns each connection a `ConnectionId`.
//! - Spawns:
//!   - a per-connection task to handle I/O,
//!   - a single central hub task that owns `ChatHub`.
//!
//! The actual per-connection logic and hub loop live in `client`
//! and `hub_task` modules respectively.

use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chat_core::{ChatHub, ConnectionId};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::auth::TokenVerifier;
use crate::client;
use crate::config::Config;
use crate::hub_task;
use crate::types::{HubRx, HubTx};

/// Process-wide counter for assigning unique `ConnectionId`s.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    ConnectionId(id)
}

/// Pause after an accept error that is not tied to a single connection
/// (e.g. out of file descriptors), so the loop does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

fn accept_retry_delay(err: &io::Error) -> Duration {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => Duration::ZERO,
        _ => ACCEPT_BACKOFF,
    }
}

/// Bind the configured address and serve until shut down.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    serve(listener, config).await
}

/// Serve on an already bound listener.
///
/// Accept errors are logged and retried; they never end the loop.
pub async fn serve(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    let verifier = config
        .jwt_secret
        .as_deref()
        .map(|secret| Arc::new(TokenVerifier::new(secret.as_bytes())));

    // Channel from connection tasks → hub task.
    let (hub_tx, hub_rx): (HubTx, HubRx) = mpsc::unbounded_channel();

    // Spawn the central hub task.
    let hub = ChatHub::with_policy(config.identity_policy());
    tokio::spawn(hub_task::run_hub_loop(hub_rx, hub));

    let active = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                let delay = accept_retry_delay(&e);
                warn!(error = %e, ?delay, "accept failed");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }
        };

        if active.load(Ordering::Relaxed) >= config.max_clients {
            warn!(
                %peer_addr,
                max_clients = config.max_clients,
                "rejecting connection: max_clients reached"
            );
            // Just drop the stream; client will see the connection closed.
            continue;
        }

        let conn = next_connection_id();
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%conn, error = %e, "set_nodelay failed");
        }
        active.fetch_add(1, Ordering::Relaxed);
        info!(%conn, %peer_addr, "accepted connection");

        let hub_tx = hub_tx.clone();
        let verifier = verifier.clone();
        let active = active.clone();
        let max_line_bytes = config.max_line_bytes;

        tokio::spawn(async move {
            match client::run_client(conn, stream, hub_tx, verifier, max_line_bytes).await {
                Ok(()) => info!(%conn, "client disconnected"),
                Err(e) => warn!(%conn, error = %e, "client error"),
            }
            active.fetch_sub(1, Ordering::Relaxed);
        });
    }
}
