//! Per-device tag subscriptions.
//!
//! Each device in the directory gets its own task observing the device's
//! `tag_values` channel. The task forwards an update to the orchestrator only
//! when the observed aggregate or loading flag actually changed, so the
//! orchestrator's work stays proportional to the devices that moved.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use super::directory::Device;
use super::view::DeviceState;
use crate::core::document::Document;

/// Channel carrying a device's tag aggregate.
pub const TAG_VALUES_CHANNEL: &str = "tag_values";

/// Channel carrying an agent's deployment configuration.
pub const DEPLOYMENT_CONFIG_CHANNEL: &str = "deployment_config";

/// Current value of one `(entity, channel)` subscription.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub aggregate: Option<Arc<Document>>,
    pub is_loading: bool,
}

impl ChannelSnapshot {
    pub fn loading() -> Self {
        Self {
            aggregate: None,
            is_loading: true,
        }
    }

    pub fn ready(aggregate: Arc<Document>) -> Self {
        Self {
            aggregate: Some(aggregate),
            is_loading: false,
        }
    }
}

impl Default for ChannelSnapshot {
    fn default() -> Self {
        Self::loading()
    }
}

impl From<&ChannelSnapshot> for DeviceState {
    fn from(snapshot: &ChannelSnapshot) -> Self {
        DeviceState::new(snapshot.aggregate.clone(), snapshot.is_loading)
    }
}

/// Publish/subscribe capability delivering channel aggregates.
///
/// The returned receiver always holds the channel's latest snapshot and is
/// notified whenever it changes.
pub trait TagChannel: Send + Sync {
    fn subscribe(&self, entity_id: &str, channel: &str) -> watch::Receiver<ChannelSnapshot>;
}

/// Change reported by a subscription adapter.
#[derive(Debug, Clone)]
pub struct DeviceUpdate {
    pub device_id: String,
    pub state: DeviceState,
}

/// Handle to a running per-device subscription task.
///
/// Stopping (or dropping) the handle ends the task.
pub struct SubscriptionAdapter {
    device_id: String,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SubscriptionAdapter {
    /// Spawn the adapter task. Must be called from within a tokio runtime.
    pub fn spawn(
        device_id: impl Into<String>,
        snapshots: watch::Receiver<ChannelSnapshot>,
        update_tx: mpsc::Sender<DeviceUpdate>,
    ) -> Self {
        let device_id = device_id.into();
        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(adapter_task(
            device_id.clone(),
            snapshots,
            update_tx,
            stop_rx,
        ));

        Self {
            device_id,
            stop_tx: Some(stop_tx),
        }
    }

    pub fn stop(mut self) {
        self.signal_stop();
    }

    fn signal_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            log::trace!("stopping subscription for {}", self.device_id);
            // The task may already be gone if its channel closed.
            let _ = stop_tx.send(());
        }
    }
}

impl Drop for SubscriptionAdapter {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

async fn adapter_task(
    device_id: String,
    mut snapshots: watch::Receiver<ChannelSnapshot>,
    update_tx: mpsc::Sender<DeviceUpdate>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    log::debug!("subscription for {} started", device_id);
    let mut last: Option<DeviceState> = None;

    loop {
        let state = DeviceState::from(&*snapshots.borrow_and_update());
        let changed = last.as_ref().map_or(true, |previous| !previous.same_as(&state));

        if changed {
            let update = DeviceUpdate {
                device_id: device_id.clone(),
                state: state.clone(),
            };
            if update_tx.send(update).await.is_err() {
                break;
            }
            last = Some(state);
        }

        tokio::select! {
            result = snapshots.changed() => {
                if result.is_err() {
                    log::debug!("tag channel for {} closed", device_id);
                    break;
                }
            }
            _ = &mut stop_rx => break,
        }
    }

    log::debug!("subscription for {} stopped", device_id);
}

/// Adapters keyed by device id, kept in step with the directory.
pub struct SubscriptionSet {
    channel: Arc<dyn TagChannel>,
    update_tx: mpsc::Sender<DeviceUpdate>,
    adapters: HashMap<String, SubscriptionAdapter>,
}

impl SubscriptionSet {
    pub fn new(channel: Arc<dyn TagChannel>, update_tx: mpsc::Sender<DeviceUpdate>) -> Self {
        Self {
            channel,
            update_tx,
            adapters: HashMap::new(),
        }
    }

    /// Start adapters for new devices and stop adapters for departed ones.
    ///
    /// Returns `(added, removed)`.
    pub fn reconcile(&mut self, devices: &[Device]) -> (usize, usize) {
        let before = self.adapters.len();
        self.adapters
            .retain(|id, _| devices.iter().any(|device| &device.id == id));
        let removed = before - self.adapters.len();

        let mut added = 0;
        for device in devices {
            if self.adapters.contains_key(&device.id) {
                continue;
            }
            let snapshots = self.channel.subscribe(&device.id, TAG_VALUES_CHANNEL);
            let adapter = SubscriptionAdapter::spawn(&device.id, snapshots, self.update_tx.clone());
            self.adapters.insert(device.id.clone(), adapter);
            added += 1;
        }

        if added > 0 || removed > 0 {
            log::info!(
                "subscriptions reconciled: {} added, {} removed, {} active",
                added,
                removed,
                self.adapters.len()
            );
        }
        (added, removed)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.adapters.contains_key(device_id)
    }

    /// Stop every adapter.
    pub fn clear(&mut self) {
        self.adapters.clear();
    }
}
