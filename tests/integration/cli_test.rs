use mdash::cli::build_cli;
use mdash::commands::options::{apply_overrides, resolve_config};
use mdash::core::config::{DashboardConfig, FeedSource};
use tempfile::TempDir;

#[test]
fn test_requires_subcommand() {
    assert!(build_cli().try_get_matches_from(["mdash"]).is_err());
}

#[test]
fn test_config_flag_selects_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mdash.json");
    DashboardConfig {
        agent_id: Some("from-file".to_string()),
        refresh_secs: 15,
        ..Default::default()
    }
    .save_to(&path)
    .unwrap();

    let matches = build_cli()
        .try_get_matches_from(["mdash", "snapshot", "--config", path.to_str().unwrap()])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    let config = resolve_config(sub).unwrap();
    assert_eq!(config.agent_id.as_deref(), Some("from-file"));
    assert_eq!(config.refresh_secs, 15);
}

#[test]
fn test_ws_override() {
    let matches = build_cli()
        .try_get_matches_from(["mdash", "watch", "--ws", "wss://fleet.example.com/feed"])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    let mut config = DashboardConfig::default();
    apply_overrides(&mut config, sub);
    assert_eq!(
        config.feed,
        Some(FeedSource::WebSocket {
            url: "wss://fleet.example.com/feed".to_string()
        })
    );
}

#[test]
fn test_config_init_subcommand_parses() {
    let matches = build_cli()
        .try_get_matches_from(["mdash", "config", "init", "--agent-id", "hub", "--force"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "config");
    let (name, init) = sub.subcommand().unwrap();
    assert_eq!(name, "init");
    assert!(init.get_flag("force"));
}
