//! The front-end loop: relays notifications to the notify channels.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::shutdown::StopSignal;
use crate::transport::{FrontendConnection, MessageContext};

/// How [`Frontend::run`] ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendExit {
    /// The stop signal fired.
    Stopped,
    /// The server closed the connection.
    Disconnected,
}

/// The front-end component. Sole writer to its connection.
pub struct Frontend {
    conn: Box<dyn FrontendConnection>,
    notify: Vec<MessageContext>,
    connected: bool,
    closed: bool,
}

impl Frontend {
    pub fn new(conn: Box<dyn FrontendConnection>, notify_targets: Vec<String>) -> Self {
        Self {
            conn,
            notify: notify_targets.into_iter().map(MessageContext::new).collect(),
            connected: false,
            closed: false,
        }
    }

    pub fn notify_targets(&self) -> impl Iterator<Item = &str> {
        self.notify.iter().map(|c| c.target.as_str())
    }

    /// Connect and register. Later calls do nothing.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.connected {
            return Ok(());
        }
        self.conn.connect().await?;
        self.connected = true;
        info!(targets = self.notify.len(), "front-end connected");
        Ok(())
    }

    /// Connect if needed, then serve inbound messages and `notifications`
    /// until the connection ends or `stop` fires. Transport errors are
    /// returned.
    pub async fn run(
        &mut self,
        mut notifications: Option<mpsc::Receiver<String>>,
        mut stop: StopSignal,
    ) -> Result<FrontendExit, TransportError> {
        self.connect().await?;

        loop {
            tokio::select! {
                _ = stop.stopped() => return Ok(FrontendExit::Stopped),
                Some(text) = recv(&mut notifications) => self.deliver(&text).await?,
                inbound = self.conn.next_message() => match inbound? {
                    Some(message) => debug!(
                        sender = message.sender.as_deref().unwrap_or("?"),
                        target = %message.target,
                        text = %message.text,
                        "front-end message"
                    ),
                    None => {
                        info!("front-end connection closed by the server");
                        return Ok(FrontendExit::Disconnected);
                    }
                },
            }
        }
    }

    async fn deliver(&mut self, text: &str) -> Result<(), TransportError> {
        for context in &self.notify {
            self.conn.reply(context, text).await?;
        }
        Ok(())
    }

    /// Close the connection. Only the first call reaches the transport.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.conn.close().await;
    }
}

/// Receive from an optional channel; pending forever when there is none.
async fn recv(rx: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
