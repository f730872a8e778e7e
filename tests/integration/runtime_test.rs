use std::sync::Arc;
use std::time::Duration;

use mdash::core::channels::{ChannelHub, OutboundCommand};
use mdash::core::fleet::{
    run_orchestrator, DashboardSnapshot, RuntimeSettings, UiCommand, DEPLOYMENT_CONFIG_CHANNEL,
    TAG_VALUES_CHANNEL,
};
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const AGENT: &str = "A";
const APP: &str = "maintenance_dashboard_1";
const NS: &str = "maintenance_manager_1";

struct Harness {
    hub: Arc<ChannelHub>,
    snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    commands: mpsc::Sender<UiCommand>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl Harness {
    fn start(refresh_period: Duration) -> Self {
        let hub = Arc::new(ChannelHub::new());
        let mut settings = RuntimeSettings::new(AGENT, APP, NS);
        settings.refresh_period = refresh_period;

        let (snapshot_tx, snapshots) = watch::channel(Arc::new(DashboardSnapshot {
            config_loading: true,
            ..Default::default()
        }));
        let (commands, command_rx) = mpsc::channel(8);
        let (shutdown, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(run_orchestrator(
            settings,
            hub.clone(),
            hub.clone(),
            snapshot_tx,
            command_rx,
            shutdown_rx,
        ));

        Self {
            hub,
            snapshots,
            commands,
            shutdown,
            task,
        }
    }

    fn publish_devices(&self, map: Value) {
        self.hub.publish(
            AGENT,
            DEPLOYMENT_CONFIG_CHANNEL,
            json!({ "applications": { APP: { "DEVICE_MAP": map } } }),
        );
    }

    fn publish_tags(&self, device: &str, tags: Value) {
        self.hub.publish(device, TAG_VALUES_CHANNEL, json!({ NS: tags }));
    }

    async fn wait_for<F>(&mut self, mut predicate: F) -> Arc<DashboardSnapshot>
    where
        F: FnMut(&DashboardSnapshot) -> bool,
    {
        timeout(Duration::from_secs(5), self.snapshots.wait_for(|s| predicate(s.as_ref())))
            .await
            .expect("timed out waiting for snapshot")
            .expect("orchestrator stopped")
            .clone()
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = timeout(Duration::from_secs(5), self.task).await;
    }
}

fn ids(snapshot: &DashboardSnapshot) -> Vec<&str> {
    snapshot.rows.iter().map(|row| row.device.id.as_str()).collect()
}

#[tokio::test]
async fn test_loading_until_config_arrives() {
    let harness = Harness::start(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = harness.snapshots.borrow().clone();
    assert!(snapshot.config_loading);
    assert!(snapshot.rows.is_empty());
    // Only the deployment config channel is known so far.
    assert_eq!(harness.hub.channel_count(), 1);

    harness.stop().await;
}

#[tokio::test]
async fn test_empty_device_map() {
    let mut harness = Harness::start(Duration::from_secs(60));
    harness.publish_devices(json!({ AGENT: "Hub" }));

    let snapshot = harness.wait_for(|s| !s.config_loading).await;
    assert!(snapshot.is_empty());
    assert!(harness.hub.current(AGENT, TAG_VALUES_CHANNEL).is_none());

    harness.stop().await;
}

#[tokio::test]
async fn test_rows_sorted_by_next_service() {
    let mut harness = Harness::start(Duration::from_secs(60));
    harness.publish_devices(json!({ AGENT: "Hub", "B": "Truck 2", "C": "Truck 3" }));

    let snapshot = harness.wait_for(|s| s.rows.len() == 2).await;
    assert!(snapshot.rows.iter().all(|row| row.values.is_loading));

    harness.publish_tags("C", json!({ "next_service_est": 2_000_000 }));
    harness.publish_tags("B", json!({ "next_service_est": 1_000_000, "kms_till_next_service": "42" }));

    let snapshot = harness.wait_for(|s| s.is_settled()).await;
    assert_eq!(ids(&snapshot), vec!["B", "C"]);
    assert_eq!(snapshot.rows[0].values.kms_till_next_service, Some(42.0));

    harness.publish_tags("C", json!({ "next_service_est": 10 }));
    let snapshot = harness.wait_for(|s| ids(s) == ["C", "B"]).await;
    assert_eq!(snapshot.rows[0].device.name, "Truck 3");

    harness.stop().await;
}

#[tokio::test]
async fn test_refresh_tick_keeps_rows() {
    let mut harness = Harness::start(Duration::from_millis(50));
    harness.publish_devices(json!({ "B": "Truck 2" }));
    harness.publish_tags("B", json!({ "next_service_est": 1 }));

    let before = harness.wait_for(|s| s.is_settled() && !s.rows.is_empty()).await;
    let seq = before.refresh_seq;
    let channels = harness.hub.channel_count();
    let after = harness.wait_for(|s| s.refresh_seq > seq).await;

    assert!(Arc::ptr_eq(&before.rows, &after.rows));
    assert_eq!(before.revision, after.revision);
    assert_eq!(harness.hub.channel_count(), channels);

    harness.stop().await;
}

#[tokio::test]
async fn test_reset_service_round_trip() {
    let mut harness = Harness::start(Duration::from_secs(60));
    let (transport_tx, mut transport_rx) = mpsc::channel::<OutboundCommand>(4);
    harness.hub.attach_transport(transport_tx);

    harness.publish_devices(json!({ "B": "Truck 2" }));
    harness.publish_tags("B", json!({ "hours_till_next_service": 3 }));
    harness.wait_for(|s| s.is_settled() && !s.rows.is_empty()).await;

    harness
        .commands
        .send(UiCommand::ResetService("B".to_string()))
        .await
        .unwrap();
    harness.wait_for(|s| s.rows[0].pending).await;

    // A second request while pending is not sent.
    harness
        .commands
        .send(UiCommand::ResetService("B".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let command = timeout(Duration::from_secs(5), transport_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(command.entity_id, "B");
    assert_eq!(command.payload, json!({ "maintenance_manager_1_reset_service": true }));
    command.reply.send(Ok(())).unwrap();

    harness.wait_for(|s| !s.rows[0].pending).await;
    assert!(transport_rx.try_recv().is_err());

    harness.stop().await;
}

#[tokio::test]
async fn test_pending_survives_device_leaving_and_returning() {
    let mut harness = Harness::start(Duration::from_secs(60));
    let (transport_tx, mut transport_rx) = mpsc::channel::<OutboundCommand>(4);
    harness.hub.attach_transport(transport_tx);

    harness.publish_devices(json!({ "B": "Truck 2" }));
    harness.publish_tags("B", json!({ "hours_till_next_service": 3 }));
    harness.wait_for(|s| s.is_settled() && !s.rows.is_empty()).await;

    harness
        .commands
        .send(UiCommand::ResetService("B".to_string()))
        .await
        .unwrap();
    let first = timeout(Duration::from_secs(5), transport_rx.recv())
        .await
        .unwrap()
        .unwrap();

    harness.publish_devices(json!({}));
    harness.wait_for(|s| !s.config_loading && s.rows.is_empty()).await;
    harness.publish_devices(json!({ "B": "Truck 2" }));
    let snapshot = harness.wait_for(|s| s.rows.len() == 1).await;
    assert!(snapshot.rows[0].pending);

    // Still in flight, so a second request is not sent.
    harness
        .commands
        .send(UiCommand::ResetService("B".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transport_rx.try_recv().is_err());

    first.reply.send(Ok(())).unwrap();
    harness
        .wait_for(|s| s.rows.len() == 1 && !s.rows[0].pending)
        .await;

    harness.stop().await;
}

#[tokio::test]
async fn test_failed_reset_clears_pending() {
    let mut harness = Harness::start(Duration::from_secs(60));
    let (transport_tx, mut transport_rx) = mpsc::channel::<OutboundCommand>(4);
    harness.hub.attach_transport(transport_tx);

    harness.publish_devices(json!({ "B": "Truck 2" }));
    harness.publish_tags("B", json!({}));
    harness.wait_for(|s| s.is_settled() && !s.rows.is_empty()).await;

    harness
        .commands
        .send(UiCommand::ResetService("B".to_string()))
        .await
        .unwrap();
    harness.wait_for(|s| s.rows[0].pending).await;

    let command = timeout(Duration::from_secs(5), transport_rx.recv())
        .await
        .unwrap()
        .unwrap();
    drop(command);

    harness.wait_for(|s| !s.rows.is_empty() && !s.rows[0].pending).await;
    harness.stop().await;
}

#[tokio::test]
async fn test_removed_device_leaves_view() {
    let mut harness = Harness::start(Duration::from_secs(60));
    harness.publish_devices(json!({ "B": "Truck 2", "C": "Truck 3" }));
    harness.publish_tags("B", json!({ "next_service_est": 1 }));
    harness.publish_tags("C", json!({ "next_service_est": 2 }));
    harness.wait_for(|s| s.is_settled() && s.rows.len() == 2).await;

    harness.publish_devices(json!({ "C": "Truck 3" }));
    let snapshot = harness.wait_for(|s| s.rows.len() == 1).await;
    assert_eq!(ids(&snapshot), vec!["C"]);

    // Late data from the removed device changes nothing.
    harness.publish_tags("B", json!({ "next_service_est": 0 }));
    harness.publish_tags("C", json!({ "next_service_est": 5 }));
    let snapshot = harness
        .wait_for(|s| s.rows[0].values.next_service_est == Some(5.0))
        .await;
    assert_eq!(ids(&snapshot), vec!["C"]);

    harness.stop().await;
}

#[tokio::test]
async fn test_config_reload_keeps_directory() {
    let mut harness = Harness::start(Duration::from_secs(60));
    harness.publish_devices(json!({ "B": "Truck 2" }));
    harness.wait_for(|s| s.rows.len() == 1).await;

    harness.hub.mark_loading(AGENT, DEPLOYMENT_CONFIG_CHANNEL);
    let snapshot = harness.wait_for(|s| s.config_loading).await;
    assert_eq!(ids(&snapshot), vec!["B"]);

    harness.stop().await;
}
