//! Feed messages and file replay.
//!
//! A feed is anything that produces channel updates for the hub. Messages are
//! JSON objects tagged by `type`; the same format is used by replay files
//! (one message per line) and by the WebSocket bridge.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep, Duration};

use super::hub::ChannelHub;
use crate::error::{MdashError, Result};

/// Inbound feed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// New aggregate for one agent's channel.
    Aggregate {
        agent_id: String,
        channel: String,
        aggregate: Value,
    },
    /// The channel is reloading.
    Loading { agent_id: String, channel: String },
    /// Outcome of a command sent over the same connection.
    CommandResult {
        request_id: u64,
        ok: bool,
        #[serde(default)]
        error: Option<String>,
    },
}

impl FeedMessage {
    /// Apply a channel message to the hub.
    ///
    /// Returns `false` for messages that are not channel updates.
    pub fn apply(&self, hub: &ChannelHub) -> bool {
        match self {
            FeedMessage::Aggregate {
                agent_id,
                channel,
                aggregate,
            } => {
                hub.publish(agent_id, channel, aggregate.clone());
                true
            }
            FeedMessage::Loading { agent_id, channel } => {
                hub.mark_loading(agent_id, channel);
                true
            }
            FeedMessage::CommandResult { .. } => false,
        }
    }
}

/// Parse one replay line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<FeedMessage>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Replay a JSON-lines file into the hub, waiting `pace` between messages.
///
/// Malformed lines are logged and skipped. Returns the number of messages
/// applied.
pub async fn replay_file(hub: &ChannelHub, path: &Path, pace: Duration) -> Result<usize> {
    let file = File::open(path)
        .await
        .map_err(|e| MdashError::feed(format!("cannot open {}: {}", path.display(), e)))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut applied = 0;
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("{}:{}: skipping undecodable feed line: {}", path.display(), line_no, e);
                continue;
            }
        };

        match parse_line(line) {
            Ok(Some(message)) => {
                if message.apply(hub) {
                    applied += 1;
                    if !pace.is_zero() {
                        sleep(pace).await;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("{}:{}: skipping malformed feed line: {}", path.display(), line_no, e),
        }
    }

    log::info!("replayed {} messages from {}", applied, path.display());
    Ok(applied)
}
