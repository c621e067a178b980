//! Minimal IRC client transport for wikiwatch.
//!
//! Provides the line codec and a TCP connection that handles registration,
//! channel joins and keep-alive. Chat commands are not implemented here.

pub mod connection;
pub mod error;
pub mod message;

pub use connection::IrcConnection;
pub use error::IrcError;
pub use message::IrcMessage;
