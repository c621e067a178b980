//! Feed line parsing.
//!
//! A raw line from the recent-changes channel is first stripped of IRC color
//! codes, then matched against two grammars in order: the edit grammar (which
//! carries a diff URL) and the log grammar (which does not). The first match
//! wins; a line matching neither is a [`ParseError`].

use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::event::{EventFields, FeedEvent};

// ── Patterns ──────────────────────────────────────────────────────────────────

/// IRC color code: `^C` optionally followed by `fg` or `fg,bg` (1–2 digits each).
pub const COLOR_CODE: &str = r"\x03(?:[0-9]{1,2}(?:,[0-9]{1,2})?)?";

/// `[[page]] flags http://url * user * comment`
pub const EDIT_GRAMMAR: &str =
    r"\A\[\[(.*?)\]\]\s(.*?)\s(http://.*?)\s\*\s(.*?)\s\*\s(.*?)\z";

/// `[[page]] flags * user * comment`
pub const LOG_GRAMMAR: &str = r"\A\[\[(.*?)\]\]\s(.*?)\s\*\s(.*?)\s\*\s(.*?)\z";

fn color_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COLOR_CODE).expect("regex is valid"))
}

// ── Grammar ───────────────────────────────────────────────────────────────────

/// The two line grammars, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Edit,
    Log,
}

impl Grammar {
    pub const ORDER: [Grammar; 2] = [Grammar::Edit, Grammar::Log];

    /// The compiled pattern for this grammar.
    pub fn pattern(self) -> &'static Regex {
        static EDIT: OnceLock<Regex> = OnceLock::new();
        static LOG: OnceLock<Regex> = OnceLock::new();
        match self {
            Grammar::Edit => EDIT.get_or_init(|| Regex::new(EDIT_GRAMMAR).expect("regex is valid")),
            Grammar::Log => LOG.get_or_init(|| Regex::new(LOG_GRAMMAR).expect("regex is valid")),
        }
    }

    /// Return the first grammar in [`Grammar::ORDER`] that matches `line`.
    pub fn match_line(line: &str) -> Option<(Grammar, Captures<'_>)> {
        Self::ORDER
            .into_iter()
            .find_map(|grammar| grammar.pattern().captures(line).map(|caps| (grammar, caps)))
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A feed line matched neither grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognised feed line: {line:?}")]
pub struct ParseError {
    /// The line after color stripping.
    pub line: String,
}

// ── EventParser ───────────────────────────────────────────────────────────────

/// Turns raw feed lines into [`FeedEvent`]s.
///
/// # Example
///
/// ```
/// use wikiwatch_feed::parser::EventParser;
///
/// let parser = EventParser::new("http://en.wikipedia.org/wiki/");
/// let event = parser.parse("[[Foo]] delete * Bar * reason").unwrap();
/// assert!(!event.is_edit());
/// assert_eq!(event.url(), "http://en.wikipedia.org/wiki/Foo");
/// ```
#[derive(Debug, Clone)]
pub struct EventParser {
    /// Prefix joined with the page title to build URLs for log entries.
    article_path: String,
}

impl EventParser {
    pub fn new(article_path: impl Into<String>) -> Self {
        Self {
            article_path: article_path.into(),
        }
    }

    /// Parse one raw line from the feed.
    pub fn parse(&self, raw: &str) -> Result<FeedEvent, ParseError> {
        let line = strip_colors(raw);

        let Some((grammar, caps)) = Grammar::match_line(&line) else {
            return Err(ParseError { line });
        };

        let event = match grammar {
            Grammar::Edit => FeedEvent::Edit(EventFields {
                page: caps[1].to_string(),
                flags: caps[2].to_string(),
                url: caps[3].to_string(),
                user: caps[4].to_string(),
                comment: caps[5].to_string(),
            }),
            Grammar::Log => {
                let page = caps[1].to_string();
                // The page title is joined verbatim; spaces are not encoded.
                let url = format!("{}{}", self.article_path, page);
                FeedEvent::Log(EventFields {
                    page,
                    // Log lines carry a trailing space after the action.
                    flags: caps[2].trim().to_string(),
                    url,
                    user: caps[3].to_string(),
                    comment: caps[4].to_string(),
                })
            }
        };

        Ok(event)
    }
}

/// Remove IRC color codes and surrounding whitespace.
pub fn strip_colors(raw: &str) -> String {
    color_code().replace_all(raw, "").trim().to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "http://en.wikipedia.org/wiki/";

    fn parser() -> EventParser {
        EventParser::new(PREFIX)
    }

    // ── strip_colors ──────────────────────────────────────────────────────────

    #[test]
    fn test_strip_colors_removes_all_forms() {
        assert_eq!(strip_colors("\x03plain"), "plain");
        assert_eq!(strip_colors("\x034red"), "red");
        assert_eq!(strip_colors("\x0314grey"), "grey");
        assert_eq!(strip_colors("\x0304,12pair"), "pair");
        assert_eq!(strip_colors("\x033,4x\x03"), "x");
    }

    #[test]
    fn test_strip_colors_consumes_at_most_two_digits() {
        assert_eq!(strip_colors("\x03123"), "3");
        assert_eq!(strip_colors("\x031,234"), "4");
    }

    #[test]
    fn test_strip_colors_trims_whitespace() {
        assert_eq!(strip_colors("  \x0303 text \x03  "), "text");
    }

    // ── edit grammar ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_colored_edit_line() {
        let raw = "\x0314[[\x0307Foo bar\x0314]]\x034 M\x0310 \x0302http://en.wikipedia.org/w/index.php?diff=2&oldid=1\x03 \x035*\x03 \x0303Alice\x03 \x035*\x03 (+12) \x0310fix typo\x03";
        let event = parser().parse(raw).expect("edit line parses");

        assert!(event.is_edit());
        assert_eq!(event.page(), "Foo bar");
        assert_eq!(event.flags(), "M");
        assert_eq!(
            event.url(),
            "http://en.wikipedia.org/w/index.php?diff=2&oldid=1"
        );
        assert_eq!(event.user(), "Alice");
        assert_eq!(event.comment(), "(+12) fix typo");
    }

    #[test]
    fn test_parse_edit_fields_non_empty() {
        let event = parser()
            .parse("[[Foo]] MB http://example.org/diff * Bot * tidy")
            .unwrap();
        let f = event.fields();
        for value in [&f.page, &f.flags, &f.url, &f.user, &f.comment] {
            assert!(!value.is_empty());
        }
    }

    #[test]
    fn test_parse_edit_without_flags() {
        let event = parser()
            .parse("[[Foo]]  http://example.org/diff * Alice * c")
            .unwrap();
        assert!(event.is_edit());
        assert_eq!(event.flags(), "");
    }

    #[test]
    fn test_parse_edit_keeps_flag_whitespace() {
        // Only log-form flags are trimmed.
        let event = parser()
            .parse("[[Foo]] M  http://example.org/diff * Alice * c")
            .unwrap();
        assert!(event.is_edit());
        assert_eq!(event.flags(), "M ");
    }

    #[test]
    fn test_parse_https_url_is_not_an_edit() {
        let event = parser()
            .parse("[[Foo]] M https://example.org/diff * Alice * c")
            .unwrap();
        assert!(!event.is_edit());
        assert_eq!(event.flags(), "M https://example.org/diff");
    }

    // ── log grammar ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_log_line_synthesizes_url() {
        let raw = "\x0314[[\x0307Special:Log/delete\x0314]]\x034 delete\x0310 \x0302\x03 \x035*\x03 \x0303Admin\x03 \x035*\x03  \x0310deleted \"[[Bar]]\"\x03";
        let event = parser().parse(raw).expect("log line parses");

        assert!(!event.is_edit());
        assert_eq!(event.page(), "Special:Log/delete");
        assert_eq!(event.flags(), "delete");
        assert_eq!(event.url(), format!("{PREFIX}Special:Log/delete"));
        assert_eq!(event.user(), "Admin");
        assert_eq!(event.comment(), " deleted \"[[Bar]]\"");
    }

    #[test]
    fn test_parse_log_url_does_not_encode_spaces() {
        let event = parser().parse("[[Foo bar]] create * Carol * new").unwrap();
        assert_eq!(event.url(), "http://en.wikipedia.org/wiki/Foo bar");
    }

    #[test]
    fn test_parse_log_uses_configured_prefix() {
        let event = EventParser::new("https://wiki.example/w/")
            .parse("[[Page]] protect * Dan * why")
            .unwrap();
        assert_eq!(event.url(), "https://wiki.example/w/Page");
    }

    // ── failures ──────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_rejects_unmatched_line() {
        let err = parser().parse("\x0304hello world").unwrap_err();
        assert_eq!(err.line, "hello world");
        assert!(err.to_string().contains("hello world"));
    }

    #[test]
    fn test_parse_rejects_missing_user_separator() {
        assert!(parser().parse("[[Foo]] M http://x * Alice").is_err());
        assert!(parser().parse("").is_err());
    }

    #[test]
    fn test_grammar_order_prefers_edit() {
        let (grammar, _) = Grammar::match_line("[[A]] N http://x * u * c").unwrap();
        assert_eq!(grammar, Grammar::Edit);
        let (grammar, _) = Grammar::match_line("[[A]] N * u * c").unwrap();
        assert_eq!(grammar, Grammar::Log);
    }
}
