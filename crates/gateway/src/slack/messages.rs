//! Slack message builders for batch lifecycle events.

use ocsync_core::BatchResult;

use super::types::{Block, ContextElement, PlainText, Text};

/// Build the message posted after a batch is finalized.
#[must_use]
pub fn build_batch_finalized_message(result: &BatchResult, host: &str) -> Vec<Block> {
    vec![
        Block::Header {
            text: PlainText::new("✅ Catalog sync finalized"),
        },
        Block::text(format!("Batch `{}` is now the active catalog.", result.batch_uid)),
        Block::fields(vec![
            Text::mrkdwn(format!("*Active products*\n{}", result.products)),
            Text::mrkdwn(format!("*Active categories*\n{}", result.categories)),
            Text::mrkdwn(format!("*Orphan images removed*\n{}", result.deleted_files)),
        ]),
        Block::Divider,
        Block::Context {
            elements: vec![ContextElement::Mrkdwn {
                text: format!("Gateway `{host}`"),
            }],
        },
    ]
}

/// Build the message posted when finalizing a batch fails.
#[must_use]
pub fn build_batch_failed_message(batch_uid: &str, reason: &str, host: &str) -> Vec<Block> {
    vec![
        Block::Header {
            text: PlainText::new("⚠️ Catalog sync not finalized"),
        },
        Block::text(format!("Batch `{batch_uid}` was not applied.")),
        Block::text(format!("*Reason:*\n```\n{reason}\n```")),
        Block::Context {
            elements: vec![ContextElement::Mrkdwn {
                text: format!("Gateway `{host}`"),
            }],
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_finalized_message_counts() {
        let blocks =
            build_batch_finalized_message(&BatchResult::finished("b-42", 120, 14, 3), "gw-1");
        let json = serde_json::to_string(&blocks).unwrap();
        assert!(json.contains("b-42"));
        assert!(json.contains("*Active products*\\n120"));
        assert!(json.contains("*Orphan images removed*\\n3"));
        assert!(json.contains("gw-1"));
    }

    #[test]
    fn test_failed_message_includes_reason() {
        let blocks = build_batch_failed_message("b-7", "empty batch: b-7", "gw-1");
        assert_eq!(blocks.len(), 4);
        let json = serde_json::to_string(&blocks).unwrap();
        assert!(json.contains("empty batch: b-7"));
    }
}
