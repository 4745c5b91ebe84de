//! Rebase marker parsing.
//!
//! Downstream commits declare how they should be treated on rebase with a
//! marker of the form `UPSTREAM: <tag>:` anywhere in the message. The tag is
//! one or more ASCII letters, digits, `_`, `<` or `>`, immediately followed
//! by a colon. Only the first well-formed marker counts.

use std::fmt;

use serde::Serialize;

const MARKER: &str = "UPSTREAM: ";

/// What to do with a downstream commit during a rebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Replay the commit on the new base.
    Carry,
    /// Leave the commit behind.
    Drop,
    /// Backport of the numbered upstream pull request.
    UpstreamPick(u64),
    /// Unrecognized tag, or `None` when the message has no marker at all.
    Unknown(Option<String>),
}

impl Action {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "<carry>" => Self::Carry,
            "<drop>" => Self::Drop,
            digits if digits.bytes().all(|b| b.is_ascii_digit()) => digits
                .parse()
                .map_or_else(|_| Self::Unknown(Some(tag.to_string())), Self::UpstreamPick),
            other => Self::Unknown(Some(other.to_string())),
        }
    }

    /// Whether the commit goes through the carry flow.
    #[must_use]
    pub const fn is_replayed(&self) -> bool {
        matches!(self, Self::Carry | Self::UpstreamPick(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Carry => f.write_str("carry"),
            Self::Drop => f.write_str("drop"),
            Self::UpstreamPick(pr) => write!(f, "upstream-pick #{pr}"),
            Self::Unknown(Some(tag)) => write!(f, "unknown {tag}"),
            Self::Unknown(None) => f.write_str("unmarked"),
        }
    }
}

/// Classify a commit message by its rebase marker.
///
/// Never fails: a missing or malformed marker yields [`Action::Unknown`].
#[must_use]
pub fn classify(message: &str) -> Action {
    extract_tag(message).map_or(Action::Unknown(None), Action::from_tag)
}

/// Extract the tag of the first well-formed marker in `message`.
#[must_use]
pub fn extract_tag(message: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(pos) = message[offset..].find(MARKER) {
        let start = offset + pos + MARKER.len();
        let rest = &message[start..];
        let len = rest.find(|c: char| !is_tag_char(c)).unwrap_or(rest.len());
        if len > 0 && rest[len..].starts_with(':') {
            return Some(&rest[..len]);
        }
        // 'U' is one byte, so this stays on a char boundary.
        offset += pos + 1;
    }
    None
}

const fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '<' | '>')
}
