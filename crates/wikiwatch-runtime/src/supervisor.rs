//! Keeps the watcher running: reconnect with a fixed backoff after any failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use wikiwatch_feed::FeedPipeline;

use crate::error::WatcherError;
use crate::shutdown::StopSignal;
use crate::transport::FeedConnector;
use crate::watcher::Watcher;

/// Counters returned when the supervisor is stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    /// Connections created.
    pub attempts: u64,
    /// Runs that ended in an error, end of stream included.
    pub failures: u64,
}

pub struct WatcherSupervisor {
    connector: Arc<dyn FeedConnector>,
    watcher: Watcher,
    backoff: Duration,
}

impl WatcherSupervisor {
    pub fn new(connector: Arc<dyn FeedConnector>, pipeline: FeedPipeline, backoff: Duration) -> Self {
        Self {
            connector,
            watcher: Watcher::new(pipeline),
            backoff,
        }
    }

    /// Send notifications to the front-end instead of logging them.
    pub fn with_forwarding(mut self, forward: mpsc::Sender<String>) -> Self {
        self.watcher = self.watcher.with_forwarding(forward);
        self
    }

    pub fn forwards(&self) -> bool {
        self.watcher.forwards()
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run until `stop` fires. Failures are logged and retried, never returned.
    pub async fn run(&self, mut stop: StopSignal) -> SupervisorReport {
        let mut report = SupervisorReport::default();

        while !stop.is_stopped() {
            let mut conn = self.connector.connection();
            report.attempts += 1;
            info!(attempt = report.attempts, "starting watcher");

            let outcome = tokio::select! {
                _ = stop.stopped() => None,
                result = self.watcher.run(conn.as_mut()) => Some(result),
            };
            conn.close().await;

            let Some(Err(failure)) = outcome else {
                break;
            };
            report.failures += 1;
            match failure {
                WatcherError::Transport(e) => {
                    warn!(attempt = report.attempts, error = %e, "watcher connection failed")
                }
                WatcherError::Closed => {
                    warn!(attempt = report.attempts, "feed connection closed")
                }
                WatcherError::Parse(e) => {
                    error!(attempt = report.attempts, error = %e, "watcher stopped on a bad feed line")
                }
            }

            info!(backoff_secs = self.backoff.as_secs_f64(), "restarting watcher after backoff");
            tokio::select! {
                _ = stop.stopped() => break,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        info!(
            attempts = report.attempts,
            failures = report.failures,
            "watcher supervisor stopped"
        );
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
