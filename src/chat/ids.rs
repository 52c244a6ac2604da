//! Identifier type for conversations.
//!
//! This module is intentionally **type-heavy** and **logic-light**: a single
//! newtype wrapping a short random token, plus generation, parsing, and
//! formatting helpers.
//!
//! The token is the first 8 hex characters of a UUIDv4. That keeps record
//! file names short and readable in the sidebar while staying
//! collision-resistant enough for a single-user storage namespace; the store
//! additionally re-draws on the (unlikely) collision with an existing record.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex characters kept from the generating UUID.
const TOKEN_LEN: usize = 8;

/// Opaque identifier for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(uuid[..TOKEN_LEN].to_string())
    }

    /// Borrow the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether every character of `token` is safe to embed in a file name.
    fn is_valid_token(token: &str) -> bool {
        !token.is_empty()
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing an identifier that is empty or contains
/// characters unsafe for a record file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationIdParseError(String);

impl fmt::Display for ConversationIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid conversation id: {:?}", self.0)
    }
}

impl std::error::Error for ConversationIdParseError {}

impl FromStr for ConversationId {
    type Err = ConversationIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid_token(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ConversationIdParseError(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_short_hex() {
        let id = ConversationId::new();
        assert_eq!(id.as_str().len(), TOKEN_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_two_ids_differ() {
        // Collisions over 32 bits of entropy are possible but would make
        // this test flaky on the order of one run in four billion.
        assert_ne!(ConversationId::new(), ConversationId::new());
    }

    #[test]
    fn test_parse_accepts_existing_tokens() {
        let parsed = ConversationId::from_str("a1b2c3d4");
        assert_eq!(parsed.map(|id| id.to_string()), Ok("a1b2c3d4".to_string()));
    }

    #[test]
    fn test_parse_rejects_unsafe_tokens() {
        assert!(ConversationId::from_str("").is_err());
        assert!(ConversationId::from_str("../etc/passwd").is_err());
        assert!(ConversationId::from_str("a b").is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ConversationId::from_str("deadbeef").unwrap_or_default();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, r#""deadbeef""#);
    }
}
