//! IRC-backed feed and front-end connections.

use async_trait::async_trait;
use wikiwatch_core::settings::{FrontendConfig, WatcherConfig};
use wikiwatch_irc::{IrcConnection, IrcMessage};

use crate::error::TransportError;
use crate::transport::{
    ChatMessage, FeedConnection, FeedConnector, FrontendConnection, MessageContext,
};

fn is_privmsg_to(message: &IrcMessage, channel: &str) -> bool {
    message.command == "PRIVMSG"
        && message
            .param(0)
            .is_some_and(|target| target.eq_ignore_ascii_case(channel))
}

// ── Feed ──────────────────────────────────────────────────────────────────────

/// Builds one [`IrcFeed`] per watcher attempt from the watcher config.
#[derive(Debug, Clone)]
pub struct IrcFeedConnector {
    config: WatcherConfig,
}

impl IrcFeedConnector {
    pub fn new(config: WatcherConfig) -> Self {
        Self { config }
    }
}

impl FeedConnector for IrcFeedConnector {
    fn connection(&self) -> Box<dyn FeedConnection> {
        Box::new(IrcFeed::new(&self.config))
    }
}

/// Feed connection that yields the text of PRIVMSGs to the feed channel and
/// ignores every other message.
pub struct IrcFeed {
    conn: IrcConnection,
    feed_channel: String,
}

impl IrcFeed {
    pub fn new(config: &WatcherConfig) -> Self {
        Self {
            conn: IrcConnection::new(config.server.clone(), vec![config.feed_channel.clone()]),
            feed_channel: config.feed_channel.clone(),
        }
    }
}

#[async_trait]
impl FeedConnection for IrcFeed {
    async fn connect(&mut self) -> Result<(), TransportError> {
        Ok(self.conn.connect().await?)
    }

    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let Some(message) = self.conn.next_message().await? else {
                return Ok(None);
            };
            if is_privmsg_to(&message, &self.feed_channel) {
                return Ok(Some(message.trailing().unwrap_or_default().to_string()));
            }
        }
    }

    async fn close(&mut self) {
        self.conn.close().await;
    }
}

// ── Front-end ─────────────────────────────────────────────────────────────────

pub struct IrcFrontend {
    conn: IrcConnection,
}

impl IrcFrontend {
    pub fn new(config: &FrontendConfig) -> Self {
        Self {
            conn: IrcConnection::new(config.server.clone(), channels_to_join(config)),
        }
    }
}

/// `channels` plus every notify target that is a channel, without duplicates.
/// Most networks refuse messages to a channel from non-members.
fn channels_to_join(config: &FrontendConfig) -> Vec<String> {
    let mut channels = config.channels.clone();
    for target in config.notify_targets() {
        let is_channel = target.starts_with(['#', '&', '+', '!']);
        if is_channel && !channels.iter().any(|c| c.eq_ignore_ascii_case(target)) {
            channels.push(target.clone());
        }
    }
    channels
}

#[async_trait]
impl FrontendConnection for IrcFrontend {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.conn.connect().await?;
        Ok(self.conn.wait_registered().await?)
    }

    async fn next_message(&mut self) -> Result<Option<ChatMessage>, TransportError> {
        loop {
            let Some(message) = self.conn.next_message().await? else {
                return Ok(None);
            };
            if message.command != "PRIVMSG" {
                continue;
            }
            return Ok(Some(ChatMessage {
                sender: message.source_nick().map(str::to_string),
                target: message.param(0).unwrap_or_default().to_string(),
                text: message.trailing().unwrap_or_default().to_string(),
            }));
        }
    }

    async fn reply(&mut self, context: &MessageContext, text: &str) -> Result<(), TransportError> {
        Ok(self.conn.say(&context.target, text).await?)
    }

    async fn close(&mut self) {
        self.conn.close().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
