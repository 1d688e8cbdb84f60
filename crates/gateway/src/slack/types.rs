//! Slack Block Kit types.
//!
//! The subset needed for plain status messages.
//!
//! See: <https://api.slack.com/block-kit>

use serde::{Deserialize, Serialize};

use super::error::SlackError;

/// A Slack message with blocks.
#[derive(Debug, Clone, Serialize)]
pub struct SlackMessage {
    /// Channel ID to post to.
    pub channel: String,
    /// Message blocks.
    pub blocks: Vec<Block>,
    /// Optional plain text fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Block Kit block types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Header block with large text.
    Header { text: PlainText },
    /// Section block with text or fields.
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
    },
    /// Context block with small muted text.
    Context { elements: Vec<ContextElement> },
    /// Divider block (horizontal line).
    Divider,
}

impl Block {
    /// Section with a single markdown paragraph.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Section {
            text: Some(Text::mrkdwn(text)),
            fields: Vec::new(),
        }
    }

    /// Section laid out as a two-column grid of markdown fields.
    #[must_use]
    pub fn fields(fields: Vec<Text>) -> Self {
        Self::Section { text: None, fields }
    }
}

/// Text object types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    /// Plain text (no formatting).
    PlainText { text: String, emoji: bool },
    /// Markdown text (supports formatting).
    Mrkdwn { text: String },
}

impl Text {
    /// Create a plain text object.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    /// Create a markdown text object.
    #[must_use]
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

/// Plain text object (for headers).
#[derive(Debug, Clone, Serialize)]
pub struct PlainText {
    #[serde(rename = "type")]
    pub text_type: &'static str,
    pub text: String,
    pub emoji: bool,
}

impl PlainText {
    /// Create a new plain text object.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text",
            text: text.into(),
            emoji: true,
        }
    }
}

/// Context block elements.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    /// Markdown text in context.
    Mrkdwn { text: String },
}

/// Reply to `chat.postMessage`. Only the outcome is used.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    /// Error code if `ok` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl PostMessageResponse {
    /// # Errors
    ///
    /// Returns `SlackError::Api` with Slack's error code when `ok` is false.
    pub fn into_result(self) -> Result<(), SlackError> {
        if self.ok {
            Ok(())
        } else {
            Err(SlackError::Api(
                self.error.unwrap_or_else(|| "unknown_error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_block_serialization() {
        let json = serde_json::to_value(Block::text("*hello*")).unwrap();
        assert_eq!(json["type"], "section");
        assert_eq!(json["text"]["type"], "mrkdwn");
        assert_eq!(json["text"]["text"], "*hello*");
        assert!(json.get("fields").is_none());

        let json = serde_json::to_value(Block::Divider).unwrap();
        assert_eq!(json["type"], "divider");
    }

    #[test]
    fn test_fields_section_omits_text() {
        let json =
            serde_json::to_value(Block::fields(vec![Text::mrkdwn("a"), Text::mrkdwn("b")])).unwrap();
        assert!(json.get("text").is_none());
        assert_eq!(json["fields"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_header_plain_text() {
        let json = serde_json::to_value(Block::Header {
            text: PlainText::new("Catalog sync"),
        })
        .unwrap();
        assert_eq!(json["text"]["type"], "plain_text");
        assert_eq!(json["text"]["emoji"], true);
    }

    #[test]
    fn test_post_message_response_error() {
        let response: PostMessageResponse =
            serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(SlackError::Api(code)) if code == "channel_not_found"
        ));

        let response: PostMessageResponse =
            serde_json::from_str(r#"{"ok":true,"channel":"C1","ts":"1.2"}"#).unwrap();
        assert!(response.into_result().is_ok());
    }
}
