//! Raw line → parsed event → category → notification text.

use crate::classifier::{classify_event, Classification};
use crate::event::FeedEvent;
use crate::formatter::format_notification;
use crate::parser::{EventParser, ParseError};

/// A fully processed feed line, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub event: FeedEvent,
    pub classification: Classification,
    /// Colored IRC text.
    pub text: String,
}

/// Runs a raw line through parsing, classification and formatting.
///
/// A line either yields a complete [`Notification`] or a [`ParseError`];
/// nothing partial is ever produced.
#[derive(Debug, Clone)]
pub struct FeedPipeline {
    parser: EventParser,
}

impl FeedPipeline {
    pub fn new(parser: EventParser) -> Self {
        Self { parser }
    }

    pub fn process(&self, raw: &str) -> Result<Notification, ParseError> {
        let event = self.parser.parse(raw)?;
        let classification = classify_event(&event);
        tracing::debug!(
            page = event.page(),
            flags = event.flags(),
            tentative = ?classification.tentative,
            category = %classification.category,
            "classified feed event"
        );
        let text = format_notification(&event, classification.category);
        Ok(Notification {
            event,
            classification,
            text,
        })
    }
}
