use std::io::Write;
use std::time::Duration;

use mdash::core::channels::{replay_file, ChannelHub, FeedMessage};
use serde_json::json;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_replay_applies_messages_in_order() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# fleet replay").unwrap();
    writeln!(
        file,
        "{}",
        json!({"type": "aggregate", "agent_id": "B", "channel": "tag_values", "aggregate": {"mm": {"kms_till_next_service": 10}}})
    )
    .unwrap();
    writeln!(file, "this line is not json").unwrap();
    writeln!(file).unwrap();
    writeln!(
        file,
        "{}",
        json!({"type": "aggregate", "agent_id": "B", "channel": "tag_values", "aggregate": {"mm": {"kms_till_next_service": 7}}})
    )
    .unwrap();
    writeln!(file, "{}", json!({"type": "loading", "agent_id": "C", "channel": "tag_values"})).unwrap();
    file.flush().unwrap();

    let hub = ChannelHub::new();
    let applied = replay_file(&hub, file.path(), Duration::ZERO).await.unwrap();
    assert_eq!(applied, 3);

    let b = hub.current("B", "tag_values").unwrap();
    assert!(!b.is_loading);
    assert_eq!(
        b.aggregate.unwrap().number(&["mm", "kms_till_next_service"]),
        Some(7.0)
    );
    assert!(hub.current("C", "tag_values").unwrap().is_loading);
}

#[tokio::test]
async fn test_replay_missing_file_fails() {
    let hub = ChannelHub::new();
    let result = replay_file(&hub, std::path::Path::new("/nonexistent/fleet.jsonl"), Duration::ZERO).await;
    assert!(result.is_err());
}

#[test]
fn test_command_result_is_not_a_channel_update() {
    let hub = ChannelHub::new();
    let message: FeedMessage =
        serde_json::from_value(json!({"type": "command_result", "request_id": 3, "ok": true})).unwrap();
    assert!(!message.apply(&hub));
    assert_eq!(hub.channel_count(), 0);
}
