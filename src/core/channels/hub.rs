//! In-memory channel hub.
//!
//! Holds the latest snapshot of every `(entity, channel)` pair that a feed
//! has published or a view has subscribed to, and routes UI commands to an
//! attached transport.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};

use crate::core::document::Document;
use crate::core::fleet::{ChannelSnapshot, CommandFuture, CommandSink, TagChannel};
use crate::error::{MdashError, Result};

type ChannelKey = (String, String);

/// Command handed to a transport, answered through `reply`.
#[derive(Debug)]
pub struct OutboundCommand {
    pub entity_id: String,
    pub payload: Value,
    pub reply: oneshot::Sender<Result<()>>,
}

#[derive(Default)]
pub struct ChannelHub {
    channels: Mutex<HashMap<ChannelKey, watch::Sender<ChannelSnapshot>>>,
    transport: Mutex<Option<mpsc::Sender<OutboundCommand>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fresh aggregate for `(entity_id, channel)`.
    pub fn publish(&self, entity_id: &str, channel: &str, aggregate: Value) {
        let snapshot = ChannelSnapshot::ready(Arc::new(Document::new(aggregate)));
        self.sender(entity_id, channel).send_replace(snapshot);
    }

    /// Put `(entity_id, channel)` back into the loading state.
    pub fn mark_loading(&self, entity_id: &str, channel: &str) {
        self.sender(entity_id, channel)
            .send_replace(ChannelSnapshot::loading());
    }

    /// Latest snapshot, if the pair is known.
    pub fn current(&self, entity_id: &str, channel: &str) -> Option<ChannelSnapshot> {
        self.channels
            .lock()
            .get(&(entity_id.to_string(), channel.to_string()))
            .map(|sender| sender.borrow().clone())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Route commands to `transport`. Without one, commands are only logged.
    pub fn attach_transport(&self, transport: mpsc::Sender<OutboundCommand>) {
        *self.transport.lock() = Some(transport);
    }

    pub fn detach_transport(&self) {
        self.transport.lock().take();
    }

    fn sender(&self, entity_id: &str, channel: &str) -> watch::Sender<ChannelSnapshot> {
        self.channels
            .lock()
            .entry((entity_id.to_string(), channel.to_string()))
            .or_insert_with(|| watch::channel(ChannelSnapshot::loading()).0)
            .clone()
    }
}

impl TagChannel for ChannelHub {
    fn subscribe(&self, entity_id: &str, channel: &str) -> watch::Receiver<ChannelSnapshot> {
        self.sender(entity_id, channel).subscribe()
    }
}

impl CommandSink for ChannelHub {
    fn send_command(&self, entity_id: &str, payload: Value) -> CommandFuture {
        let transport = self.transport.lock().clone();
        let entity_id = entity_id.to_string();

        Box::pin(async move {
            let Some(transport) = transport else {
                log::info!("command for {} (no transport attached): {}", entity_id, payload);
                return Ok(());
            };

            let (reply_tx, reply_rx) = oneshot::channel();
            transport
                .send(OutboundCommand {
                    entity_id,
                    payload,
                    reply: reply_tx,
                })
                .await
                .map_err(|_| MdashError::command("command transport closed"))?;

            reply_rx
                .await
                .map_err(|_| MdashError::command("command transport dropped the request"))?
        })
    }
}
