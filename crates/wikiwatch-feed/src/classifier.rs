//! Map a feed event's flags and page to a notification category.
//!
//! Classification runs in two stages. The first picks a tentative category
//! from the log action (`N`, `delete`, `protect`, `create`). The second always
//! decides the final category: `move` for the move log, otherwise an edit
//! category built from the `B` and `M` flags. The tentative category therefore
//! never survives into the result; it is kept on [`Classification`] so callers
//! can log what the first stage saw.

use std::fmt;

use crate::event::FeedEvent;

/// Page title of the move log.
pub const MOVE_LOG_PAGE: &str = "Special:Log/move";

// ── EventCategory ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Page,
    Deletion,
    Protection,
    User,
    Move,
    Edit,
    BotEdit,
    MinorEdit,
    MinorBotEdit,
}

impl EventCategory {
    /// Stable identifier, e.g. `"minor-bot-edit"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Page => "page",
            EventCategory::Deletion => "deletion",
            EventCategory::Protection => "protection",
            EventCategory::User => "user",
            EventCategory::Move => "move",
            EventCategory::Edit => "edit",
            EventCategory::BotEdit => "bot-edit",
            EventCategory::MinorEdit => "minor-edit",
            EventCategory::MinorBotEdit => "minor-bot-edit",
        }
    }

    /// Wording used in notifications after `"New "`, e.g. `"minor bot edit"`.
    pub fn label(self) -> &'static str {
        match self {
            EventCategory::BotEdit => "bot edit",
            EventCategory::MinorEdit => "minor edit",
            EventCategory::MinorBotEdit => "minor bot edit",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Classification ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// What the log-action stage picked, if anything.
    pub tentative: Option<EventCategory>,
    /// The category used for the notification.
    pub category: EventCategory,
}

/// Classify from raw `flags` and `page`. Pure and deterministic.
pub fn classify(flags: &str, page: &str) -> Classification {
    let tentative = if flags.contains('N') {
        Some(EventCategory::Page)
    } else {
        match flags {
            "delete" => Some(EventCategory::Deletion),
            "protect" => Some(EventCategory::Protection),
            "create" => Some(EventCategory::User),
            _ => None,
        }
    };

    let category = if page == MOVE_LOG_PAGE {
        EventCategory::Move
    } else {
        // Bot is applied first, then minor wraps it.
        match (flags.contains('M'), flags.contains('B')) {
            (true, true) => EventCategory::MinorBotEdit,
            (true, false) => EventCategory::MinorEdit,
            (false, true) => EventCategory::BotEdit,
            (false, false) => EventCategory::Edit,
        }
    };

    Classification {
        tentative,
        category,
    }
}

/// Classify a parsed event.
pub fn classify_event(event: &FeedEvent) -> Classification {
    classify(event.flags(), event.page())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
