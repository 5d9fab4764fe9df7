//! Interactive line client for the chat server (text encoding).
//!
//! ```text
//! cargo run -p chat-server --example chat_client -- --user alice
//! ```

use anyhow::Result;
use chat_core::{InputEvent, OutputEvent};
use chat_protocol::text_codec::{format_client, parse_server_line};
use chat_protocol::ClientFrame;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "chat-client")]
#[command(about = "Join the chat server and talk to other online users")]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Identifier to join as
    #[arg(short, long)]
    user: String,

    /// Token to authenticate with before joining
    #[arg(short, long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("Connecting to {}...", cli.server);
    let stream = TcpStream::connect(&cli.server).await?;
    let (read_half, mut write_half) = stream.into_split();
    println!("Connected as {}.", cli.user);
    println!("Type `<receiver> <message>` to send, or 'quit' to leave.\n");

    let mut handshake = Vec::new();
    if let Some(token) = cli.token {
        handshake.push(ClientFrame::Authenticate { token });
    }
    handshake.push(ClientFrame::Event(InputEvent::join(cli.user.clone())));
    for frame in &handshake {
        write_half
            .write_all(format!("{}\n", format_client(frame)).as_bytes())
            .await?;
    }

    // Print everything the server pushes.
    let printer = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_server_line(&line) {
                Ok(OutputEvent::UserStatus(online)) => println!("<< online: {}", online.join(", ")),
                Ok(OutputEvent::ReceiveMessage(m)) => {
                    println!("<< [{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.sender_id, m.content)
                }
                Ok(OutputEvent::Error(e)) => eprintln!("<< error: {}", e),
                Err(_) => println!("<< {}", line),
            }
        }
        println!("Server closed the connection.");
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            println!("Exiting client.");
            break;
        }

        let Some((receiver, content)) = trimmed.split_once(' ') else {
            eprintln!("Usage: <receiver> <message>");
            continue;
        };

        let frame = ClientFrame::Event(InputEvent::send_message(
            cli.user.clone(),
            receiver,
            content.trim(),
        ));
        write_half
            .write_all(format!("{}\n", format_client(&frame)).as_bytes())
            .await?;
    }

    printer.abort();
    Ok(())
}
