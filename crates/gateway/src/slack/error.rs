//! Slack-related errors.

use thiserror::Error;

/// Errors that can occur when posting to Slack.
#[derive(Debug, Error)]
pub enum SlackError {
    /// Transport failure, non-2xx status or undecodable reply.
    #[error("Slack request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered `ok: false`.
    #[error("Slack API error: {0}")]
    Api(String),
}
