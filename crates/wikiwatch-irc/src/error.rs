use thiserror::Error;

/// Errors from the IRC transport.
#[derive(Error, Debug)]
pub enum IrcError {
    /// Socket-level failure while connecting, reading or writing.
    #[error("IRC I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line from the server could not be parsed as an IRC message.
    #[error("Malformed IRC line: {0:?}")]
    Malformed(String),

    /// An operation needed a live connection and there was none.
    #[error("Not connected to {0}")]
    NotConnected(String),

    /// The socket closed before the server accepted the registration.
    #[error("Connection to {0} closed before registration completed")]
    NotRegistered(String),

    /// The server sent ERROR and is closing the link.
    #[error("Server closed the link: {0}")]
    ServerError(String),
}

pub type Result<T> = std::result::Result<T, IrcError>;
