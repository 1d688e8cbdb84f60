//! Slack notifications for catalog sync runs.
//!
//! This module provides:
//! - [`SlackClient`] for posting messages to a channel
//! - Block Kit types for building rich messages
//! - Message builders for batch finalize outcomes
//!
//! Notifications are informational: a failed post is logged and never fails
//! the operation that triggered it.

mod client;
mod error;
mod messages;
mod types;

pub use client::SlackClient;
pub use error::SlackError;
pub use messages::{build_batch_failed_message, build_batch_finalized_message};
pub use types::{Block, ContextElement, PlainText, PostMessageResponse, Text};
