use mdash::core::document::Document;
use mdash::core::fleet::{resolve_devices, Device};
use serde_json::json;

fn deployment(app_key: &str, map: serde_json::Value) -> Document {
    Document::new(json!({ "applications": { app_key: { "DEVICE_MAP": map } } }))
}

#[test]
fn test_devices_in_map_order_without_self() {
    let config = deployment(
        "maintenance_dashboard_1",
        json!({"A": "Hub", "B": "Truck 2", "C": "Truck 3"}),
    );
    let devices = resolve_devices(&config, "maintenance_dashboard_1", Some("A"));
    assert_eq!(
        devices,
        vec![Device::new("B", "Truck 2"), Device::new("C", "Truck 3")]
    );
}

#[test]
fn test_other_app_key_is_ignored() {
    let config = deployment("other_dashboard", json!({"B": "Truck 2"}));
    assert!(resolve_devices(&config, "maintenance_dashboard_1", Some("A")).is_empty());
}

#[test]
fn test_missing_applications_yields_nothing() {
    let config = Document::new(json!({"version": 3}));
    assert!(resolve_devices(&config, "maintenance_dashboard_1", None).is_empty());
}

#[test]
fn test_non_object_map_yields_nothing() {
    let config = deployment("dash", json!(["B", "C"]));
    assert!(resolve_devices(&config, "dash", None).is_empty());
}

#[test]
fn test_without_self_id_keeps_every_entry() {
    let config = deployment("dash", json!({"A": "Hub", "B": "Truck 2"}));
    assert_eq!(resolve_devices(&config, "dash", None).len(), 2);
}
