use mdash::core::config::{DashboardConfig, FeedSource};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = DashboardConfig::default();
    assert!(config.agent_id.is_none());
    assert_eq!(config.widget.app_key, "maintenance_dashboard_1");
}

#[test]
fn test_config_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = DashboardConfig {
        agent_id: Some("hub-7".to_string()),
        feed: Some(FeedSource::WebSocket {
            url: "ws://localhost:9000/feed".to_string(),
        }),
        refresh_secs: 30,
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let loaded = DashboardConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_missing_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = DashboardConfig::load_from(&temp_dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded, DashboardConfig::default());
}

#[test]
fn test_config_corrupt_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let loaded = DashboardConfig::load_from(&path).unwrap();
    assert_eq!(loaded, DashboardConfig::default());
}

#[test]
fn test_config_empty_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "   \n").unwrap();

    assert_eq!(DashboardConfig::load_from(&path).unwrap(), DashboardConfig::default());
}
