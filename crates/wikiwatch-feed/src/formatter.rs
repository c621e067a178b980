//! Render a classified event as a colored IRC line.

use crate::classifier::EventCategory;
use crate::event::FeedEvent;

// ── Control codes ─────────────────────────────────────────────────────────────

pub const BOLD: &str = "\x02";
pub const RESET: &str = "\x0F";
pub const BLUE: &str = "\x0302";
pub const GREEN: &str = "\x0303";
pub const PURPLE: &str = "\x0306";
pub const ORANGE: &str = "\x0307";
pub const TEAL: &str = "\x0310";
pub const GREY: &str = "\x0314";

/// Build the notification text for `event`.
///
/// Edits show the bracketed page title; log entries start at the user.
///
/// ```text
/// New edit: [[Page]] * User * http://... * summary
/// New move: User * http://... * summary
/// ```
pub fn format_notification(event: &FeedEvent, category: EventCategory) -> String {
    let head = format!("{BOLD}New {}{RESET}: ", category.label());
    let tail = format!(
        "{PURPLE} *{BLUE} {}{PURPLE} *{TEAL} {}",
        event.url(),
        event.comment()
    );

    if event.is_edit() {
        format!(
            "{head}{GREY}[[{ORANGE}{}{GREY}]]{PURPLE} *{GREEN} {}{tail}",
            event.page(),
            event.user()
        )
    } else {
        format!("{head}{GREEN}{}{tail}", event.user())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
