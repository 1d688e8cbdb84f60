//! Batch notification message building.

use ocsync_core::BatchResult;
use ocsync_gateway::slack::{Block, build_batch_failed_message, build_batch_finalized_message};

#[test]
fn test_finalized_message_structure() {
    let result = BatchResult::finished("2026-10-19-full", 1520, 48, 12);
    let blocks = build_batch_finalized_message(&result, "127.0.0.1:9800");

    let first = blocks.first().expect("blocks not empty");
    assert!(matches!(first, Block::Header { .. }));
    assert!(blocks.iter().any(|b| matches!(b, Block::Divider)));

    let last = blocks.last().expect("blocks not empty");
    assert!(matches!(last, Block::Context { .. }));
}

#[test]
fn test_finalized_message_serializes_as_block_kit() {
    let result = BatchResult::finished("run-3", 10, 2, 0);
    let json = serde_json::to_value(build_batch_finalized_message(&result, "gw")).expect("json");

    let blocks = json.as_array().expect("array of blocks");
    assert_eq!(blocks.first().and_then(|b| b["type"].as_str()), Some("header"));

    let text = json.to_string();
    assert!(text.contains("run-3"));
    assert!(text.contains("*Active categories*\\n2"));
}

#[test]
fn test_failed_message_mentions_no_deactivation() {
    let blocks = build_batch_failed_message("run-4", "empty batch: run-4", "gw");
    let text = serde_json::to_string(&blocks).expect("json");

    assert!(text.contains("run-4"));
    assert!(text.contains("empty batch: run-4"));
    assert!(text.contains("No products were deactivated"));
}
