//! Tokio runtime and orchestrator for the dashboard.
//!
//! The orchestrator task is the only place the view is mutated. Subscription
//! adapters, the refresh clock and in-flight commands report to it over
//! channels; it publishes a complete [`DashboardSnapshot`] to the UI through a
//! watch channel after every accepted change.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Duration;

use super::directory::{resolve_devices, Device};
use super::dispatcher::{CommandSettled, CommandSink, RowDispatcher};
use super::refresh::{RefreshClock, RefreshTick, REFRESH_PERIOD};
use super::subscription::{
    ChannelSnapshot, DeviceUpdate, SubscriptionSet, TagChannel, DEPLOYMENT_CONFIG_CHANNEL,
};
use super::view::{DisplayValues, FleetView};

/// Settings the orchestrator needs from the host.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// The coordinating agent; its config lists the devices and it is
    /// excluded from the table.
    pub agent_id: String,
    /// Application entry in the config holding the device map.
    pub app_key: String,
    /// Tag namespace and reset-command prefix.
    pub manager_app_key: String,
    pub refresh_period: Duration,
}

impl RuntimeSettings {
    pub fn new(
        agent_id: impl Into<String>,
        app_key: impl Into<String>,
        manager_app_key: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            app_key: app_key.into(),
            manager_app_key: manager_app_key.into(),
            refresh_period: REFRESH_PERIOD,
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub device: Device,
    pub values: DisplayValues,
    pub pending: bool,
}

/// Everything the UI needs to draw a frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    /// The deployment config has not arrived yet.
    pub config_loading: bool,
    /// Rows in display order.
    pub rows: Arc<Vec<RowView>>,
    /// View revision the rows were built from.
    pub revision: u64,
    /// Refresh ticks seen so far.
    pub refresh_seq: u64,
}

impl DashboardSnapshot {
    fn initial() -> Self {
        Self {
            config_loading: true,
            ..Default::default()
        }
    }

    /// Config loaded but it lists no devices.
    pub fn is_empty(&self) -> bool {
        !self.config_loading && self.rows.is_empty()
    }

    /// Every listed device has reported at least once.
    pub fn is_settled(&self) -> bool {
        !self.config_loading && self.rows.iter().all(|row| !row.values.is_loading)
    }
}

/// Requests from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    ResetService(String),
}

/// Wrapper around the Tokio runtime driving the orchestrator.
pub struct DashboardRuntime {
    /// Latest dashboard snapshot
    pub snapshot_rx: watch::Receiver<Arc<DashboardSnapshot>>,

    /// UI requests into the orchestrator
    pub command_tx: mpsc::Sender<UiCommand>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    /// The runtime itself; dropping it stops every task
    runtime: tokio::runtime::Runtime,
}

impl DashboardRuntime {
    /// Build the runtime and spawn the orchestrator.
    pub fn new(
        settings: RuntimeSettings,
        channel: Arc<dyn TagChannel>,
        sink: Arc<dyn CommandSink>,
    ) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .thread_name("dashboard-worker")
            .build()?;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(DashboardSnapshot::initial()));
        let (command_tx, command_rx) = mpsc::channel(16);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        runtime.spawn(run_orchestrator(
            settings,
            channel,
            sink,
            snapshot_tx,
            command_rx,
            shutdown_tx.subscribe(),
        ));

        Ok(Self {
            snapshot_rx,
            command_tx,
            shutdown_tx,
            runtime,
        })
    }

    /// Handle for spawning work (feeds) next to the orchestrator.
    pub fn handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// Queue a UI request without blocking the caller.
    pub fn send(&self, command: UiCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("dropping UI command: {}", e);
        }
    }

    /// Shutdown the runtime gracefully.
    pub fn shutdown(self) {
        log::info!("shutting down dashboard runtime");
        let _ = self.shutdown_tx.send(());
        // Runtime will shutdown when dropped
    }
}

/// Orchestrator state. Lives entirely inside [`run_orchestrator`].
struct Orchestrator {
    settings: RuntimeSettings,
    view: FleetView,
    subscriptions: SubscriptionSet,
    dispatchers: HashMap<String, RowDispatcher>,
    sink: Arc<dyn CommandSink>,
    settled_tx: mpsc::Sender<CommandSettled>,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    config_loading: bool,
    rows: Arc<Vec<RowView>>,
    refresh_seq: u64,
}

impl Orchestrator {
    fn apply_config(&mut self, snapshot: &ChannelSnapshot) -> bool {
        let was_loading = self.config_loading;
        self.config_loading = snapshot.is_loading;
        if self.config_loading {
            // Keep the previous directory until a complete config arrives.
            return was_loading != self.config_loading;
        }

        let devices = snapshot
            .aggregate
            .as_deref()
            .map(|config| {
                resolve_devices(config, &self.settings.app_key, Some(self.settings.agent_id.as_str()))
            })
            .unwrap_or_default();

        let directory_changed = self.view.set_directory(devices);
        if directory_changed {
            self.subscriptions.reconcile(self.view.devices());
            let view = &self.view;
            // A dispatcher with a command in flight outlives its row, so a
            // device that leaves and comes back keeps its pending state.
            self.dispatchers.retain(|id, dispatcher| {
                dispatcher.is_pending() || view.devices().iter().any(|device| &device.id == id)
            });
            for device in self.view.devices() {
                self.dispatchers.entry(device.id.clone()).or_insert_with(|| {
                    RowDispatcher::new(device.id.clone(), self.settings.manager_app_key.clone())
                });
            }
        }
        directory_changed || was_loading
    }

    fn is_listed(&self, device_id: &str) -> bool {
        self.view.devices().iter().any(|device| device.id == device_id)
    }

    fn reset_service(&mut self, device_id: &str) -> bool {
        match self.dispatchers.get(device_id) {
            Some(dispatcher) if self.is_listed(device_id) => {
                dispatcher.invoke(&self.sink, self.settled_tx.clone())
            }
            _ => {
                log::debug!("reset requested for unknown device {}", device_id);
                false
            }
        }
    }

    fn rebuild_rows(&mut self) {
        let rows = self
            .view
            .sorted()
            .iter()
            .map(|device| RowView {
                device: device.clone(),
                values: self.view.display_values(&device.id),
                pending: self
                    .dispatchers
                    .get(&device.id)
                    .is_some_and(RowDispatcher::is_pending),
            })
            .collect();
        self.rows = Arc::new(rows);
    }

    fn publish(&self) {
        let snapshot = DashboardSnapshot {
            config_loading: self.config_loading,
            rows: self.rows.clone(),
            revision: self.view.revision(),
            refresh_seq: self.refresh_seq,
        };
        // send_replace keeps the value even while no receiver is attached
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }
}

/// Orchestrator task merging configuration, device updates, refresh ticks and
/// UI commands into dashboard snapshots.
pub async fn run_orchestrator(
    settings: RuntimeSettings,
    channel: Arc<dyn TagChannel>,
    sink: Arc<dyn CommandSink>,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    mut command_rx: mpsc::Receiver<UiCommand>,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!(
        "orchestrator started for agent {} (app {}, namespace {})",
        settings.agent_id,
        settings.app_key,
        settings.manager_app_key
    );

    let (update_tx, mut update_rx) = mpsc::channel::<DeviceUpdate>(64);
    let (settled_tx, mut settled_rx) = mpsc::channel::<CommandSettled>(16);
    let (tick_tx, mut tick_rx) = mpsc::channel::<RefreshTick>(4);

    let mut config_rx = channel.subscribe(&settings.agent_id, DEPLOYMENT_CONFIG_CHANNEL);
    let mut clock = RefreshClock::start(settings.refresh_period, tick_tx);

    let mut view = FleetView::new(settings.manager_app_key.clone());
    view.on_change(|revision, sorted| {
        log::debug!("view revision {} with {} devices", revision, sorted.len());
    });

    let mut state = Orchestrator {
        view,
        subscriptions: SubscriptionSet::new(channel, update_tx),
        dispatchers: HashMap::new(),
        sink,
        settled_tx,
        snapshot_tx,
        config_loading: true,
        rows: Arc::new(Vec::new()),
        refresh_seq: 0,
        settings,
    };

    let initial = config_rx.borrow_and_update().clone();
    state.apply_config(&initial);
    state.rebuild_rows();
    state.publish();

    let mut config_open = true;

    loop {
        tokio::select! {
            changed = config_rx.changed(), if config_open => {
                if changed.is_err() {
                    log::warn!("deployment config channel closed, keeping last directory");
                    config_open = false;
                    continue;
                }
                let snapshot = config_rx.borrow_and_update().clone();
                if state.apply_config(&snapshot) {
                    state.rebuild_rows();
                    state.publish();
                }
            }
            Some(update) = update_rx.recv() => {
                if state.view.apply_device_update(&update.device_id, update.state) {
                    state.rebuild_rows();
                    state.publish();
                }
            }
            Some(tick) = tick_rx.recv() => {
                // Rows stay as they are; only relative text needs a redraw.
                state.refresh_seq = tick.seq;
                state.publish();
            }
            Some(command) = command_rx.recv() => {
                let UiCommand::ResetService(device_id) = command;
                if state.reset_service(&device_id) {
                    state.rebuild_rows();
                    state.publish();
                }
            }
            Some(settled) = settled_rx.recv() => {
                log::trace!("command for {} settled", settled.device_id);
                if !state.is_listed(&settled.device_id) {
                    state.dispatchers.remove(&settled.device_id);
                }
                state.rebuild_rows();
                state.publish();
            }
            _ = shutdown.recv() => {
                log::info!("orchestrator shutting down");
                break;
            }
        }
    }

    clock.stop();
    state.subscriptions.clear();
}
