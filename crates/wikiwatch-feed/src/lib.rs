//! Recent-changes feed processing for wikiwatch.
//!
//! Strips color codes from raw feed lines, matches them against the edit and
//! log grammars, classifies the result and renders the colored notification
//! that is relayed to the front-end channel.

pub mod classifier;
pub mod event;
pub mod formatter;
pub mod parser;
pub mod pipeline;

pub use wikiwatch_core as core;

pub use classifier::{classify, EventCategory};
pub use event::{EventFields, FeedEvent};
pub use parser::{EventParser, ParseError};
pub use pipeline::{FeedPipeline, Notification};
