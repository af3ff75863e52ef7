use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Join/leave phrasing emitted by the chat server (Basque) plus English equivalents
    static ref SYSTEM_NOTICE_RE: Regex =
        Regex::new(r"(?i)sartu da|atera egin da|joined the chat|left the chat").unwrap();
}

/// Returns true if a raw line is a server join/leave notice.
pub fn is_system_notice(raw: &str) -> bool {
    SYSTEM_NOTICE_RE.is_match(raw)
}

/// A received line split into display parts. The raw text is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub raw: String,
    pub author: Option<String>,
    pub body: String,
    pub system: bool,
}

impl ChatLine {
    /// Splits `"<author>: <text>"` on the first colon. A line without a colon,
    /// or starting with one, has no author and its whole text is the body.
    pub fn parse(raw: &str) -> Self {
        let system = is_system_notice(raw);
        match raw.find(':') {
            Some(idx) if idx > 0 => {
                let author = raw[..idx].trim();
                let body = raw[idx + 1..].trim();
                Self {
                    raw: raw.to_string(),
                    author: (!author.is_empty()).then(|| author.to_string()),
                    body: (if body.is_empty() { raw } else { body }).to_string(),
                    system,
                }
            }
            _ => Self {
                raw: raw.to_string(),
                author: None,
                body: raw.to_string(),
                system,
            },
        }
    }

    /// Whether this line was written under `user_name` (case-sensitive).
    pub fn is_own(&self, user_name: &str) -> bool {
        self.author.as_deref() == Some(user_name)
    }
}
