//! Session identifier type.

use std::fmt;
use std::str::FromStr;

use crate::error::ChatBridgeError;

/// Maximum accepted length for a session identifier.
const MAX_LEN: usize = 64;

/// Caller-supplied identifier for a messaging session.
///
/// The ID doubles as the credential directory name on disk, so it is
/// validated on construction: non-empty, at most 64 bytes, restricted to
/// ASCII alphanumerics plus `.`, `_` and `-`, and must not start with a
/// dot. This rules out path traversal (`..`, absolute paths, separators)
/// without needing any later sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Validate a raw string and wrap it as a session ID.
    pub fn parse(raw: impl Into<String>) -> crate::Result<Self> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(ChatBridgeError::InvalidSessionId("empty".into()));
        }
        if raw.len() > MAX_LEN {
            return Err(ChatBridgeError::InvalidSessionId(format!(
                "longer than {} bytes",
                MAX_LEN
            )));
        }
        if raw.starts_with('.') {
            return Err(ChatBridgeError::InvalidSessionId(
                "must not start with a dot".into(),
            ));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(ChatBridgeError::InvalidSessionId(format!(
                "illegal character {:?}",
                bad
            )));
        }

        Ok(Self(raw))
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = ChatBridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
