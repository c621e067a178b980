//! A single IRC client connection over TCP.
//!
//! [`IrcConnection`] registers on connect, joins its channels once the server
//! welcomes it, and answers `PING` on its own. Everything else is handed to
//! the caller through [`IrcConnection::next_message`].

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use wikiwatch_core::settings::ServerConfig;

use crate::error::{IrcError, Result};
use crate::message::IrcMessage;

/// Numeric reply sent by the server once registration succeeds.
const RPL_WELCOME: &str = "001";

const QUIT_REASON: &str = "wikiwatch shutting down";

pub struct IrcConnection {
    server: ServerConfig,
    /// Channels joined after the welcome reply.
    channels: Vec<String>,
    reader: Option<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
    /// Bytes of a line not yet terminated; kept across calls so a dropped
    /// `next_message` future loses nothing.
    partial: Vec<u8>,
}

impl IrcConnection {
    pub fn new(server: ServerConfig, channels: Vec<String>) -> Self {
        Self {
            server,
            channels,
            reader: None,
            writer: None,
            partial: Vec::new(),
        }
    }

    /// `host:port` of the server, for logs and errors.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Open the socket and send the registration burst.
    pub async fn connect(&mut self) -> Result<()> {
        info!(server = %self.address(), nick = %self.server.nick, "connecting to IRC");
        let stream = TcpStream::connect((self.server.host.as_str(), self.server.port)).await?;
        let (read, write) = stream.into_split();
        self.reader = Some(BufReader::new(read));
        self.writer = Some(write);
        self.partial.clear();

        if let Some(password) = self.server.password.clone() {
            self.send(&IrcMessage::pass(&password)).await?;
        }
        let nick = IrcMessage::nick(&self.server.nick);
        let user = IrcMessage::user(&self.server.ident, &self.server.realname);
        self.send(&nick).await?;
        self.send(&user).await?;
        Ok(())
    }

    /// Read until the welcome reply, so the channel joins have been sent.
    /// Anything received before it is dropped.
    pub async fn wait_registered(&mut self) -> Result<()> {
        loop {
            match self.next_message().await? {
                Some(message) if message.command == RPL_WELCOME => return Ok(()),
                Some(message) => debug!(command = %message.command, "before welcome; ignored"),
                None => return Err(IrcError::NotRegistered(self.address())),
            }
        }
    }

    /// Write one message.
    pub async fn send(&mut self, message: &IrcMessage) -> Result<()> {
        let address = self.address();
        let writer = self
            .writer
            .as_mut()
            .ok_or(IrcError::NotConnected(address))?;
        let line = format!("{}\r\n", message.to_line());
        writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Send `text` to a channel or nick.
    pub async fn say(&mut self, target: &str, text: &str) -> Result<()> {
        self.send(&IrcMessage::privmsg(target, text)).await
    }

    /// Read the next message the caller should see.
    ///
    /// Reading is cancel-safe: a partially received line is kept until the
    /// next call.
    ///
    /// `PING` is answered here and not returned. The welcome reply triggers the
    /// channel joins and is returned. `ERROR` from the server becomes
    /// [`IrcError::ServerError`]. `Ok(None)` means the server closed the socket.
    pub async fn next_message(&mut self) -> Result<Option<IrcMessage>> {
        loop {
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }

            let message = match IrcMessage::parse(&line) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "skipping unparseable line");
                    continue;
                }
            };

            match message.command.as_str() {
                "PING" => {
                    let token = message.trailing().unwrap_or_default().to_string();
                    self.send(&IrcMessage::pong(&token)).await?;
                }
                "ERROR" => {
                    let reason = message.trailing().unwrap_or_default().to_string();
                    return Err(IrcError::ServerError(reason));
                }
                RPL_WELCOME => {
                    info!(server = %self.address(), "registered");
                    for channel in self.channels.clone() {
                        debug!(%channel, "joining");
                        self.send(&IrcMessage::join(&channel)).await?;
                    }
                    return Ok(Some(message));
                }
                _ => return Ok(Some(message)),
            }
        }
    }

    /// Send QUIT and drop the socket. Safe to call when not connected.
    pub async fn close(&mut self) {
        if self.writer.is_none() {
            return;
        }
        if let Err(e) = self.send(&IrcMessage::quit(QUIT_REASON)).await {
            debug!(error = %e, "QUIT not delivered");
        }
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
        self.reader = None;
        info!(server = %self.address(), "disconnected");
    }

    /// One line without its terminator, decoded lossily; `None` at EOF.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let address = self.address();
        let reader = self
            .reader
            .as_mut()
            .ok_or(IrcError::NotConnected(address))?;
        let read = reader.read_until(b'\n', &mut self.partial).await?;
        if read == 0 && self.partial.is_empty() {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.partial)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.partial.clear();
        Ok(Some(line))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
