//! The watcher's message loop: feed lines in, notifications out.

use std::convert::Infallible;

use tokio::sync::mpsc;
use tracing::{info, warn};
use wikiwatch_feed::{FeedPipeline, Notification};

use crate::error::WatcherError;
use crate::transport::FeedConnection;

/// Turns feed lines into notifications and hands them on.
///
/// With a forwarding sender every notification goes to the front-end;
/// without one it is written to the log.
#[derive(Debug, Clone)]
pub struct Watcher {
    pipeline: FeedPipeline,
    forward: Option<mpsc::Sender<String>>,
}

impl Watcher {
    pub fn new(pipeline: FeedPipeline) -> Self {
        Self {
            pipeline,
            forward: None,
        }
    }

    pub fn with_forwarding(mut self, forward: mpsc::Sender<String>) -> Self {
        self.forward = Some(forward);
        self
    }

    pub fn forwards(&self) -> bool {
        self.forward.is_some()
    }

    /// Connect and process lines until something goes wrong.
    ///
    /// Never returns `Ok`: the end of the feed is reported as
    /// [`WatcherError::Closed`]. The caller owns `conn` and closes it.
    pub async fn run(&self, conn: &mut dyn FeedConnection) -> Result<Infallible, WatcherError> {
        conn.connect().await?;
        while let Some(line) = conn.next_line().await? {
            let notification = self.pipeline.process(&line)?;
            self.deliver(notification).await;
        }
        Err(WatcherError::Closed)
    }

    async fn deliver(&self, notification: Notification) {
        let Notification {
            event,
            classification,
            text,
        } = notification;
        match &self.forward {
            Some(tx) => {
                if tx.send(text).await.is_err() {
                    warn!(page = event.page(), "front-end is gone; notification dropped");
                }
            }
            None => info!(
                category = %classification.category,
                page = event.page(),
                user = event.user(),
                url = event.url(),
                comment = event.comment(),
                "feed event"
            ),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
