//! Dialog engine abstraction and HTTP client.
//!
//! The engine is called at most once per turn and never retried; a failure surfaces once.

mod http;

pub use http::HttpDialogEngine;

use crate::normalize::RawReply;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamCallError {
    #[error("dialog engine request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("dialog engine api error: {0}")]
    Api(String),
    #[error("dialog engine reply unreadable: {0}")]
    Reply(String),
}

/// The two upstream calls a turn can make.
#[async_trait]
pub trait DialogEngine: Send + Sync {
    /// Open `session_id` and delegate to `intent` (session-start turn).
    async fn start_session(&self, session_id: &str, intent: &str)
        -> Result<RawReply, UpstreamCallError>;

    /// Send the user's text within an existing session (continuation turn).
    async fn recognize_text(&self, session_id: &str, text: &str)
        -> Result<RawReply, UpstreamCallError>;
}
