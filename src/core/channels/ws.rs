//! WebSocket feed bridge.
//!
//! Connects to a channel server, applies every inbound feed message to the
//! hub, and carries reset commands back over the same socket. Each command is
//! tagged with a request id and resolved when the matching `command_result`
//! arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::feed::FeedMessage;
use super::hub::{ChannelHub, OutboundCommand};
use crate::error::{MdashError, Result};

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Outbound command frame.
#[derive(Debug, Serialize)]
struct CommandFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    request_id: u64,
    agent_id: &'a str,
    payload: &'a Value,
}

/// Validate a feed URL; only `ws` and `wss` are accepted.
pub fn parse_feed_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| MdashError::config(format!("invalid feed URL {}: {}", raw, e)))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(MdashError::config(format!(
            "unsupported feed URL scheme '{}', expected ws or wss",
            other
        ))),
    }
}

/// Connect to `url` and run the bridge until the socket closes.
///
/// The hub's command transport is attached for the lifetime of the
/// connection and detached afterwards, so commands issued while offline
/// resolve locally.
pub async fn run_bridge(url: Url, hub: Arc<ChannelHub>) -> Result<()> {
    let (socket, _) = connect_async(url.as_str()).await?;
    log::info!("connected to feed {}", url);

    let (mut sink, mut stream) = socket.split();
    let (command_tx, mut command_rx) = mpsc::channel::<OutboundCommand>(16);
    hub.attach_transport(command_tx);

    let mut in_flight: HashMap<u64, oneshot::Sender<Result<()>>> = HashMap::new();

    let outcome = loop {
        tokio::select! {
            frame = stream.next() => {
                let msg = match frame {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => break Err(MdashError::from(e)),
                    None => break Ok(()),
                };
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break Ok(()),
                    _ => continue,
                };
                match serde_json::from_str::<FeedMessage>(&text) {
                    Ok(FeedMessage::CommandResult { request_id, ok, error }) => {
                        if let Some(reply) = in_flight.remove(&request_id) {
                            let result = if ok {
                                Ok(())
                            } else {
                                Err(MdashError::command(error.unwrap_or_else(|| "rejected by device".to_string())))
                            };
                            let _ = reply.send(result);
                        }
                    }
                    Ok(message) => {
                        message.apply(&hub);
                    }
                    Err(e) => log::warn!("skipping malformed feed frame: {}", e),
                }
            }
            Some(command) = command_rx.recv() => {
                let request_id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);
                let frame = CommandFrame {
                    kind: "command",
                    request_id,
                    agent_id: &command.entity_id,
                    payload: &command.payload,
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        let _ = command.reply.send(Err(e.into()));
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    let _ = command.reply.send(Err(MdashError::command(format!("send failed: {}", e))));
                    break Err(e.into());
                }
                in_flight.insert(request_id, command.reply);
            }
        }
    };

    hub.detach_transport();
    // Dropping the pending replies fails their commands.
    in_flight.clear();
    log::info!("feed {} disconnected", url);
    outcome
}
