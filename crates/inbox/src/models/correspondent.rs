//! Correspondent model representing a user who wrote to the inbox

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a correspondent (the user account id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrespondentId(pub i64);

impl CorrespondentId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for CorrespondentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CorrespondentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user who sent one or more messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondent {
    /// Correspondent ID (thread key)
    pub id: CorrespondentId,
    /// Display name (e.g., "Jane Doe")
    pub name: String,
    /// Contact address (e.g., "jane@example.com")
    pub email: String,
}

impl Correspondent {
    /// Fallback contact address used when the payload carries none
    pub const FALLBACK_EMAIL: &'static str = "user@email.com";

    pub fn new(id: CorrespondentId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Build a correspondent from optional sender metadata, filling gaps
    /// with the `"User <id>"` and `"user@email.com"` placeholders.
    pub fn from_metadata(id: CorrespondentId, name: Option<&str>, email: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Self::fallback_name(id));
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(Self::FALLBACK_EMAIL)
            .to_string();

        Self { id, name, email }
    }

    pub fn fallback_name(id: CorrespondentId) -> String {
        format!("User {}", id)
    }
}
