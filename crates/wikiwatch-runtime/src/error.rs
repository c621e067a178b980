use thiserror::Error;
use wikiwatch_core::{ComponentName, WikiwatchError};
use wikiwatch_feed::ParseError;
use wikiwatch_irc::IrcError;

/// Failure of a feed or front-end connection.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Irc(#[from] IrcError),
}

/// Why one run of the watcher's message loop ended.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Watcher transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Watcher could not parse feed line: {0}")]
    Parse(#[from] ParseError),

    /// The feed connection reached end of stream.
    #[error("Feed connection closed by the server")]
    Closed,
}

/// Errors that stop the orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] WikiwatchError),

    /// A component is enabled but nothing was provided to run it.
    #[error("Component {0} is enabled but was not configured")]
    MissingCollaborator(ComponentName),

    #[error("Front-end failed: {0}")]
    Frontend(#[source] TransportError),

    /// A background component returned or panicked while the main one was
    /// still running.
    #[error("Background component {0} exited unexpectedly")]
    ComponentExited(ComponentName),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A transport failure as a dropped or refused socket reports it.
    pub(crate) fn socket_error(kind: std::io::ErrorKind) -> TransportError {
        TransportError::Irc(IrcError::Io(kind.into()))
    }

    #[test]
    fn test_error_display() {
        let parse = WatcherError::from(ParseError {
            line: "junk".to_string(),
        });
        assert_eq!(
            parse.to_string(),
            "Watcher could not parse feed line: Unrecognised feed line: \"junk\""
        );

        let transport = WatcherError::from(TransportError::from(IrcError::ServerError(
            "throttled".to_string(),
        )));
        assert_eq!(
            transport.to_string(),
            "Watcher transport failed: Server closed the link: throttled"
        );

        assert_eq!(
            RuntimeError::MissingCollaborator(ComponentName::Watcher).to_string(),
            "Component watcher is enabled but was not configured"
        );
        assert_eq!(
            RuntimeError::from(WikiwatchError::NoComponents).to_string(),
            WikiwatchError::NoComponents.to_string()
        );
    }
}
