// crates/chat-server/src/client.rs
// Handles BOTH JSON and text encodings, sniffed from the first
// significant byte.

use std::sync::Arc;

use anyhow::anyhow;
use bytes::BytesMut;
use chat_core::{ConnectionId, OutputEvent};
use chat_protocol::{ClientFrame, Encoding, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::auth::TokenVerifier;
use crate::types::{HubRequest, HubTx, OutboundRx, OutboundTx};

/// Encoding used for outbound frames until the client's first significant
/// byte has been seen.
const DEFAULT_ENCODING: Encoding = Encoding::Json;

/// Run the I/O loop for a single connection.
///
/// The connection registers with the hub as soon as it is accepted, so it
/// receives broadcasts before it has sent anything. Outbound frames use
/// JSON until the client's own input reveals its encoding.
pub async fn run_client(
    conn: ConnectionId,
    stream: TcpStream,
    hub_tx: HubTx,
    verifier: Option<Arc<TokenVerifier>>,
    max_line_bytes: usize,
) -> anyhow::Result<()> {
    let (read_stream, write_stream) = stream.into_split();

    let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();
    hub_tx
        .send(HubRequest::Connect {
            conn,
            tx: out_tx.clone(),
        })
        .map_err(|_| anyhow!("hub channel closed"))?;

    let (encoding_tx, encoding_rx) = watch::channel(DEFAULT_ENCODING);
    let writer = tokio::spawn(run_writer(conn, write_stream, out_rx, encoding_rx));

    let reader = Reader {
        conn,
        hub_tx: &hub_tx,
        out_tx: &out_tx,
        verifier: verifier.as_deref(),
        max_line_bytes,
    };
    let result = reader.run(read_stream, encoding_tx).await;

    // Always tell the hub, even after a read error.
    let _ = hub_tx.send(HubRequest::Disconnect { conn });
    drop(out_tx);

    // The writer drains whatever is queued and stops once the hub drops
    // its sender for this connection.
    let _ = writer.await;

    result
}

struct Reader<'a> {
    conn: ConnectionId,
    hub_tx: &'a HubTx,
    out_tx: &'a OutboundTx,
    verifier: Option<&'a TokenVerifier>,
    max_line_bytes: usize,
}

impl Reader<'_> {
    async fn run(
        &self,
        mut read_stream: OwnedReadHalf,
        encoding_tx: watch::Sender<Encoding>,
    ) -> anyhow::Result<()> {
        let mut buffer = BytesMut::with_capacity(4096);
        let mut detected: Option<Encoding> = None;
        // Set while skipping the tail of an oversized line.
        let mut discarding = false;

        loop {
            if read_stream.read_buf(&mut buffer).await? == 0 {
                debug!(conn = %self.conn, "EOF");
                return Ok(());
            }

            let encoding = match detected {
                Some(encoding) => encoding,
                None => match Encoding::sniff(&buffer) {
                    Some(encoding) => {
                        debug!(conn = %self.conn, ?encoding, "encoding detected");
                        // Set before any reply to this client is queued.
                        let _ = encoding_tx.send(encoding);
                        detected = Some(encoding);
                        encoding
                    }
                    None => {
                        // Only whitespace or a partial BOM so far.
                        if buffer.len() > self.max_line_bytes {
                            buffer.clear();
                        }
                        continue;
                    }
                },
            };

            // Process complete lines
            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line = buffer.split_to(newline_pos + 1);

                if discarding {
                    discarding = false;
                    continue;
                }

                let payload = &line[..newline_pos];
                let payload = payload.strip_suffix(b"\r").unwrap_or(payload);
                if payload.len() > self.max_line_bytes {
                    self.reject(ProtocolError::FrameTooLong(self.max_line_bytes));
                    continue;
                }

                match std::str::from_utf8(payload) {
                    Ok(text) => self.handle_line(encoding, text)?,
                    Err(_) => self.reject(ProtocolError::InvalidUtf8),
                }
            }

            // One extra byte leaves room for the `\r` of a CRLF ending.
            if buffer.len() > self.max_line_bytes + 1 {
                if !discarding {
                    self.reject(ProtocolError::FrameTooLong(self.max_line_bytes));
                    discarding = true;
                }
                buffer.clear();
            }
        }
    }

    fn handle_line(&self, encoding: Encoding, line: &str) -> anyhow::Result<()> {
        let conn = self.conn;

        match encoding.decode_client(line) {
            Ok(None) => {}
            Ok(Some(ClientFrame::Event(event))) => {
                debug!(%conn, ?event, "event");
                self.hub_tx
                    .send(HubRequest::Event { conn, event })
                    .map_err(|_| anyhow!("hub channel closed"))?;
            }
            Ok(Some(ClientFrame::Authenticate { token })) => match self.verifier {
                None => debug!(%conn, "verification disabled, ignoring token"),
                Some(verifier) => match verifier.verify(&token) {
                    Ok(principal) => {
                        self.hub_tx
                            .send(HubRequest::Authenticated { conn, principal })
                            .map_err(|_| anyhow!("hub channel closed"))?;
                    }
                    Err(e) => {
                        warn!(%conn, error = %e, "authentication failed");
                        let _ = self.out_tx.send(OutputEvent::error(e.to_string()));
                    }
                },
            },
            Err(e) => self.reject(e),
        }

        Ok(())
    }

    fn reject(&self, err: ProtocolError) {
        warn!(conn = %self.conn, error = %err, "malformed frame");
        let _ = self.out_tx.send(OutputEvent::error(err.to_string()));
    }
}

async fn run_writer(
    conn: ConnectionId,
    mut write_stream: OwnedWriteHalf,
    mut out_rx: OutboundRx,
    encoding_rx: watch::Receiver<Encoding>,
) {
    while let Some(event) = out_rx.recv().await {
        let encoding = *encoding_rx.borrow();
        let line = match encoding.encode_server(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!(%conn, error = %e, "encode error");
                continue;
            }
        };

        if let Err(e) = write_line(&mut write_stream, &line).await {
            debug!(%conn, error = %e, "write error");
            break;
        }
    }
}

async fn write_line(stream: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    let mut data = String::with_capacity(line.len() + 1);
    data.push_str(line);
    data.push('\n');

    stream.write_all(data.as_bytes()).await?;
    stream.flush().await
}
