//! Central hub loop.
//!
//! This task owns the `ChatHub` instance and the outbound channel of
//! every connected client, and processes all `HubRequest`s coming from
//! connection tasks in arrival order.
//!
//! Routing policy:
//! - Deliveries produced by the hub go to exactly the connection they
//!   name; a closed channel is ignored (fire-and-forget).
//! - A rejected event is answered with an `error` event to the
//!   originating connection only.

use std::collections::HashMap;

use chat_core::{ChatError, ChatHub, ConnectionId, Delivery, InputEvent, OutputEvent};
use tracing::{debug, info, warn};

use crate::types::{HubRequest, HubRx, OutboundTx};

/// Run the central hub processing loop.
///
/// - `hub_rx`: receives requests from all connection tasks.
/// - `hub`: the presence state, owned by this task from here on.
pub async fn run_hub_loop(mut hub_rx: HubRx, mut hub: ChatHub) {
    let mut outbound: HashMap<ConnectionId, OutboundTx> = HashMap::new();

    while let Some(req) = hub_rx.recv().await {
        match req {
            HubRequest::Connect { conn, tx } => {
                hub.connect(conn);
                outbound.insert(conn, tx);
                debug!(%conn, connections = hub.connection_count(), "connection registered");
            }
            HubRequest::Authenticated { conn, principal } => {
                match hub.authenticate(conn, &principal) {
                    Ok(()) => info!(%conn, user = %principal, "connection authenticated"),
                    Err(e) => reject(&outbound, conn, e),
                }
            }
            HubRequest::Event { conn, event } => {
                if let InputEvent::Join { user_id } = &event {
                    info!(%conn, user = %user_id, "join");
                }
                match hub.process_event(conn, event) {
                    Ok(deliveries) => deliver(&outbound, deliveries),
                    Err(e) => reject(&outbound, conn, e),
                }
            }
            HubRequest::Disconnect { conn } => {
                outbound.remove(&conn);
                let deliveries = hub.disconnect(conn);
                info!(%conn, online = hub.directory().len(), "connection closed");
                deliver(&outbound, deliveries);
            }
        }
    }

    info!("Hub loop shutting down (hub_rx closed)");
}

fn deliver(outbound: &HashMap<ConnectionId, OutboundTx>, deliveries: Vec<Delivery>) {
    for Delivery { to, event } in deliveries {
        if let Some(tx) = outbound.get(&to) {
            let _ = tx.send(event);
        }
    }
}

fn reject(outbound: &HashMap<ConnectionId, OutboundTx>, conn: ConnectionId, err: ChatError) {
    warn!(%conn, error = %err, "event rejected");
    if let Some(tx) = outbound.get(&conn) {
        let _ = tx.send(OutputEvent::error(err.to_string()));
    }
}
