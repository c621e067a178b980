//! Seams between the component loops and the outside world.
//!
//! The loops only see these traits; [`crate::irc_transport`] provides the IRC
//! implementations and tests provide in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TransportError;

/// A chat message received by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Nick of the sender, when the transport knows it.
    pub sender: Option<String>,
    /// Channel or nick the message was addressed to.
    pub target: String,
    pub text: String,
}

/// Where a reply is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub target: String,
}

impl MessageContext {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// One connection to the recent-changes feed.
#[async_trait]
pub trait FeedConnection: Send {
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Next raw line posted to the feed channel. `Ok(None)` at end of stream.
    async fn next_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Release the connection. Must be safe to call at any point.
    async fn close(&mut self);
}

/// Produces a fresh [`FeedConnection`] for every watcher attempt.
pub trait FeedConnector: Send + Sync {
    fn connection(&self) -> Box<dyn FeedConnection>;
}

/// The front-end's chat connection.
#[async_trait]
pub trait FrontendConnection: Send {
    /// Returns once the server accepted the connection and the channels the
    /// front-end posts to are joined.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Next inbound chat message. `Ok(None)` at end of stream.
    ///
    /// Must be cancel-safe: the front-end drops this future whenever a
    /// notification is ready to send.
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, TransportError>;

    async fn reply(&mut self, context: &MessageContext, text: &str) -> Result<(), TransportError>;

    async fn close(&mut self);
}

/// Runs whatever periodic work is due at `now`.
pub trait TaskScheduler: Send {
    fn schedule_due_tasks(&mut self, now: DateTime<Utc>);
}
