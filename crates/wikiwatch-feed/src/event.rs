//! Structured form of a single recent-changes feed line.

/// Fields shared by both kinds of feed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    /// Page title (for log entries, the log's special page, e.g. `Special:Log/delete`).
    pub page: String,
    /// Diff URL for edits; article URL synthesized from `page` for log entries.
    pub url: String,
    pub user: String,
    pub comment: String,
    /// Edit flags (`M`, `B`, `N`, ...) or a log action (`delete`, `protect`, ...).
    pub flags: String,
}

/// A parsed feed line, tagged by the grammar that matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// An edit, carrying the URL from the feed line.
    Edit(EventFields),
    /// A log entry; the feed line has no URL.
    Log(EventFields),
}

impl FeedEvent {
    pub fn fields(&self) -> &EventFields {
        match self {
            FeedEvent::Edit(fields) | FeedEvent::Log(fields) => fields,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, FeedEvent::Edit(_))
    }

    pub fn page(&self) -> &str {
        &self.fields().page
    }

    pub fn url(&self) -> &str {
        &self.fields().url
    }

    pub fn user(&self) -> &str {
        &self.fields().user
    }

    pub fn comment(&self) -> &str {
        &self.fields().comment
    }

    pub fn flags(&self) -> &str {
        &self.fields().flags
    }
}
