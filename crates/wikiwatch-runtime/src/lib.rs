//! Component runtime for wikiwatch.
//!
//! Hosts the front-end, watcher and scheduler loops, the supervisor that keeps
//! the watcher alive, and the [`Orchestrator`] that places and stops them.

pub mod error;
pub mod frontend;
pub mod irc_transport;
pub mod orchestrator;
pub mod scheduler;
pub mod shutdown;
pub mod supervisor;
pub mod tasks;
pub mod transport;
pub mod watcher;

pub use error::{RuntimeError, TransportError, WatcherError};
pub use frontend::{Frontend, FrontendExit};
pub use irc_transport::{IrcFeedConnector, IrcFrontend};
pub use orchestrator::{Collaborators, Orchestrator, RunReport, ThreadAssignment};
pub use supervisor::{SupervisorReport, WatcherSupervisor};
pub use tasks::{Task, TaskRegistry, Trigger};
pub use transport::{FeedConnection, FeedConnector, FrontendConnection, TaskScheduler};
