//! TailBeat companion
//!
//! Minimal stand-in for the inspection tool. Accepts one application at a
//! time, prints every record it sends, and forwards each stdin line (raw
//! JSON, e.g. `{"languageChangeRequest":"de"}`) as an inbound command.
//!
//! Environment variables:
//! - TAILBEAT_HOST / TAILBEAT_PORT: listen address (default 127.0.0.1:8085)
//! - TAILBEAT_LOG: tracing filter (default info)

use serde_json::Value;
use tailbeat::{ClientConfig, TailbeatError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedWriteHalf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAILBEAT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Print one received record as `kind: payload`.
fn print_record(line: &str) {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => {
            for (kind, payload) in map {
                println!("{kind}: {payload}");
            }
        }
        Ok(other) => println!("?: {other}"),
        Err(err) => warn!(error = %err, %line, "unparsable record"),
    }
}

#[tokio::main]
async fn main() -> Result<(), TailbeatError> {
    init_tracing();

    let config = ClientConfig::from_env()?;
    let listener = TcpListener::bind(config.address()).await?;
    info!(address = %config.address(), "companion listening");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut writer: Option<OwnedWriteHalf> = None;

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                info!(%peer, "application connected");
                let (read, write) = socket.into_split();
                // Latest application wins
                writer = Some(write);
                tokio::spawn(async move {
                    let mut lines = BufReader::new(read).lines();
                    loop {
                        match lines.next_line().await {
                            Ok(Some(line)) if line.is_empty() => {}
                            Ok(Some(line)) => print_record(&line),
                            Ok(None) => break,
                            Err(err) => {
                                warn!(error = %err, "read failed");
                                break;
                            }
                        }
                    }
                    info!(%peer, "application disconnected");
                });
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, exiting");
                    return Ok(());
                };
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                let Some(write) = writer.as_mut() else {
                    warn!("no application connected");
                    continue;
                };
                let record = format!("{command}\n");
                if let Err(err) = write.write_all(record.as_bytes()).await {
                    warn!(error = %err, "send failed");
                    writer = None;
                }
            }
        }
    }
}
