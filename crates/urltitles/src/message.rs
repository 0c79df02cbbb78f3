//! Incoming chat messages and URL extraction

use regex::Regex;
use std::sync::LazyLock;

/// CTCP framing byte
const CTCP_DELIM: char = '\x01';

/// Channel name prefixes
const CHANNEL_PREFIXES: &[char] = &['#', '&', '+', '!'];

/// Standard chat URL pattern: scheme, optional userinfo, host, optional
/// port, then a path that stops at whitespace and closing brackets.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:\S+@)?(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)*[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?::\d+)?(?:/[^\])>\s]*)?",
    )
    .expect("URL pattern is valid")
});

/// A message addressed to a channel or to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender nick; `None` for server-originated messages
    pub nick: Option<String>,
    /// Channel name or the bot's own nick
    pub target: String,
    /// Message text, CTCP framing included
    pub text: String,
}

/// A decoded CTCP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctcp<'a> {
    pub command: &'a str,
    pub params: &'a str,
}

impl ChatMessage {
    pub fn new(
        nick: Option<impl Into<String>>,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            nick: nick.map(Into::into),
            target: target.into(),
            text: text.into(),
        }
    }

    /// Returns true if the target is a channel rather than a nick
    pub fn is_channel(&self) -> bool {
        self.target.starts_with(CHANNEL_PREFIXES)
    }

    /// Decode CTCP framing, if present
    ///
    /// The closing delimiter is optional; some clients omit it.
    pub fn ctcp(&self) -> Option<Ctcp<'_>> {
        let inner = self.text.strip_prefix(CTCP_DELIM)?;
        let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
        let (command, params) = inner.split_once(' ').unwrap_or((inner, ""));
        Some(Ctcp { command, params })
    }

    /// Text to scan for URLs
    ///
    /// Plain messages yield their text and `/me` actions their payload.
    /// Other CTCP requests (VERSION, PING, ...) yield nothing.
    pub fn body(&self) -> Option<&str> {
        match self.ctcp() {
            None => Some(&self.text),
            Some(ctcp) if ctcp.command.eq_ignore_ascii_case("ACTION") => Some(ctcp.params),
            Some(_) => None,
        }
    }
}

/// Extract URLs from chat text in order of appearance
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}
