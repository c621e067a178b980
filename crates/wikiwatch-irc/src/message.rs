//! IRC line codec (RFC 1459 framing).
//!
//! `[:prefix] COMMAND [middle ...] [:trailing]`, terminated by CRLF, at most
//! [`MAX_LINE_LEN`] bytes including the terminator.

use std::fmt;

use crate::error::{IrcError, Result};

/// Maximum length of a line on the wire, CRLF included.
pub const MAX_LINE_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Parse one line received from the server. A trailing CR/LF is ignored.
    pub fn parse(line: &str) -> Result<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let prefix = match rest.strip_prefix(':') {
            Some(tail) => {
                let (prefix, tail) = tail
                    .split_once(' ')
                    .ok_or_else(|| IrcError::Malformed(line.to_string()))?;
                rest = tail;
                Some(prefix.to_string())
            }
            None => None,
        };

        rest = rest.trim_start_matches(' ');
        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(IrcError::Malformed(line.to_string()));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, tail) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = tail;
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nickname part of the prefix (`nick!user@host`).
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split_once('!').map_or(p, |(nick, _)| nick))
    }

    /// Parameter `idx`, if present.
    pub fn param(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// The last parameter, which carries the text of PRIVMSG/NOTICE.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    // ── Outbound constructors ─────────────────────────────────────────────

    pub fn pass(password: &str) -> Self {
        Self::new("PASS", vec![password.to_string()])
    }

    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", vec![nick.to_string()])
    }

    pub fn user(ident: &str, realname: &str) -> Self {
        Self::new(
            "USER",
            vec![
                ident.to_string(),
                "0".to_string(),
                "*".to_string(),
                realname.to_string(),
            ],
        )
    }

    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![channel.to_string()])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", vec![token.to_string()])
    }

    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", vec![reason.to_string()])
    }

    /// A PRIVMSG whose text is cut so the whole line fits in [`MAX_LINE_LEN`].
    pub fn privmsg(target: &str, text: &str) -> Self {
        // "PRIVMSG <target> :<text>\r\n"
        let overhead = "PRIVMSG ".len() + target.len() + " :".len() + 2;
        let budget = MAX_LINE_LEN.saturating_sub(overhead);
        Self::new(
            "PRIVMSG",
            vec![target.to_string(), truncate_at_char(text, budget).to_string()],
        )
    }

    /// Serialize without the CRLF terminator. CR and LF inside parameters are
    /// replaced by spaces so one message is always one line.
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        if let Some(prefix) = &self.prefix {
            line.push(':');
            line.push_str(prefix);
            line.push(' ');
        }
        line.push_str(&self.command);

        let last = self.params.len().saturating_sub(1);
        for (idx, param) in self.params.iter().enumerate() {
            let param = param.replace(['\r', '\n'], " ");
            line.push(' ');
            if idx == last && (param.is_empty() || param.contains(' ') || param.starts_with(':')) {
                line.push(':');
            }
            line.push_str(&param);
        }
        line
    }
}

impl fmt::Display for IrcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
fn truncate_at_char(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse ─────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_privmsg_with_prefix() {
        let msg =
            IrcMessage::parse(":rc-pmtpa!~rc@localhost PRIVMSG #en.wikipedia :[[Foo]] M * u * c\r\n")
                .unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("rc-pmtpa!~rc@localhost"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.param(0), Some("#en.wikipedia"));
        assert_eq!(msg.trailing(), Some("[[Foo]] M * u * c"));
        assert_eq!(msg.source_nick(), Some("rc-pmtpa"));
    }

    #[test]
    fn test_parse_ping_without_prefix() {
        let msg = IrcMessage::parse("PING :irc.example.net").unwrap();
        assert!(msg.prefix.is_none());
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params, vec!["irc.example.net".to_string()]);
    }

    #[test]
    fn test_parse_numeric_with_middle_params() {
        let msg = IrcMessage::parse(":server 001 wikiwatch :Welcome to IRC").unwrap();
        assert_eq!(msg.command, "001");
        assert_eq!(msg.params, vec!["wikiwatch", "Welcome to IRC"]);
        assert_eq!(msg.source_nick(), Some("server"));
    }

    #[test]
    fn test_parse_collapses_repeated_spaces() {
        let msg = IrcMessage::parse("join   #a   #b").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, vec!["#a", "#b"]);
    }

    #[test]
    fn test_parse_keeps_control_bytes_in_trailing() {
        let msg = IrcMessage::parse(":rc PRIVMSG #c :\x0314[[\x0307X\x0314]]").unwrap();
        assert_eq!(msg.trailing(), Some("\x0314[[\x0307X\x0314]]"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(IrcMessage::parse("").is_err());
        assert!(IrcMessage::parse(":prefixonly").is_err());
        assert!(IrcMessage::parse(":prefix ").is_err());
    }

    // ── serialize ─────────────────────────────────────────────────────────

    #[test]
    fn test_to_line_marks_trailing() {
        assert_eq!(
            IrcMessage::privmsg("#c", "hello world").to_line(),
            "PRIVMSG #c :hello world"
        );
        assert_eq!(IrcMessage::join("#c").to_line(), "JOIN #c");
        assert_eq!(
            IrcMessage::user("ww", "Real Name").to_line(),
            "USER ww 0 * :Real Name"
        );
        assert_eq!(IrcMessage::quit("").to_line(), "QUIT :");
    }

    #[test]
    fn test_to_line_strips_line_breaks() {
        let line = IrcMessage::privmsg("#c", "a\r\nQUIT :x").to_line();
        assert_eq!(line, "PRIVMSG #c :a  QUIT :x");
    }

    #[test]
    fn test_privmsg_truncates_to_line_limit() {
        let text = "é".repeat(400);
        let msg = IrcMessage::privmsg("#chan", &text);
        let wire = format!("{}\r\n", msg.to_line());
        assert!(wire.len() <= MAX_LINE_LEN);
        assert!(msg.trailing().unwrap().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        assert_eq!(truncate_at_char("abc", 10), "abc");
        assert_eq!(truncate_at_char("aé", 2), "a");
        assert_eq!(truncate_at_char("aé", 3), "aé");
    }
}
