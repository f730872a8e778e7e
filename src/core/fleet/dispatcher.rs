//! Per-row reset-service action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::error::Result;

/// Future resolving once a command has been accepted or rejected.
pub type CommandFuture = BoxFuture<'static, Result<()>>;

/// Capability for sending a UI command to a device.
pub trait CommandSink: Send + Sync {
    fn send_command(&self, entity_id: &str, payload: Value) -> CommandFuture;
}

/// Sent when an in-flight command resolves, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettled {
    pub device_id: String,
}

/// Command asking a device to reset its service counter.
pub fn reset_service_payload(namespace: &str) -> Value {
    let mut payload = serde_json::Map::new();
    payload.insert(format!("{}_reset_service", namespace), json!(true));
    Value::Object(payload)
}

/// Reset action for one device row.
///
/// At most one command is in flight per row. Failures only clear the pending
/// flag; reporting them belongs to the command sink.
pub struct RowDispatcher {
    device_id: String,
    namespace: String,
    pending: Arc<AtomicBool>,
}

impl RowDispatcher {
    pub fn new(device_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            namespace: namespace.into(),
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Submit a reset command unless one is already pending.
    ///
    /// Returns `false` without sending anything while pending. Must be called
    /// from within a tokio runtime.
    pub fn invoke(
        &self,
        sink: &Arc<dyn CommandSink>,
        settled_tx: mpsc::Sender<CommandSettled>,
    ) -> bool {
        if self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("reset for {} ignored, already pending", self.device_id);
            return false;
        }

        let command = sink.send_command(&self.device_id, reset_service_payload(&self.namespace));
        let pending = self.pending.clone();
        let device_id = self.device_id.clone();

        tokio::spawn(async move {
            match command.await {
                Ok(()) => log::info!("reset command for {} completed", device_id),
                Err(e) => log::debug!("reset command for {} failed: {}", device_id, e),
            }
            pending.store(false, Ordering::SeqCst);
            let _ = settled_tx.send(CommandSettled { device_id }).await;
        });

        true
    }
}
