//! Message model representing one entry in a conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-generated identifier for an optimistic message awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingId(pub u64);

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    Correspondent,
    Administrator,
}

/// A single message within a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server ID (None for optimistic entries not yet persisted)
    pub id: Option<MessageId>,
    /// Client ID of an optimistic entry
    #[serde(default)]
    pub pending_id: Option<PendingId>,
    /// Text content
    pub content: String,
    /// Author of the message
    pub role: AuthorRole,
    /// When the message was written
    pub sent_at: DateTime<Utc>,
    /// True when the payload had no timestamp and `sent_at` was substituted
    #[serde(default)]
    pub timestamp_estimated: bool,
    /// Read flag (always true for administrator messages)
    pub is_read: bool,
}

impl Message {
    /// Create a new message builder
    pub fn builder(role: AuthorRole) -> MessageBuilder {
        MessageBuilder::new(role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == AuthorRole::Administrator
    }

    /// Only correspondent messages can be unread.
    pub fn is_unread(&self) -> bool {
        !self.is_admin() && !self.is_read
    }

    pub fn is_pending(&self) -> bool {
        self.pending_id.is_some()
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: Option<MessageId>,
    pending_id: Option<PendingId>,
    role: AuthorRole,
    content: String,
    sent_at: Option<DateTime<Utc>>,
    fallback_at: Option<DateTime<Utc>>,
    is_read: bool,
}

impl MessageBuilder {
    fn new(role: AuthorRole) -> Self {
        Self {
            id: None,
            pending_id: None,
            role,
            content: String::new(),
            sent_at: None,
            fallback_at: None,
            is_read: false,
        }
    }

    pub fn id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn maybe_id(mut self, id: Option<MessageId>) -> Self {
        self.id = id;
        self
    }

    pub fn pending_id(mut self, pending_id: PendingId) -> Self {
        self.pending_id = Some(pending_id);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    /// Use `sent_at` when present, otherwise `fallback` flagged as estimated
    pub fn sent_at_or(mut self, sent_at: Option<DateTime<Utc>>, fallback: DateTime<Utc>) -> Self {
        self.sent_at = sent_at;
        self.fallback_at = Some(fallback);
        self
    }

    pub fn read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    pub fn build(self) -> Message {
        let (sent_at, timestamp_estimated) = match self.sent_at {
            Some(at) => (at, false),
            None => (self.fallback_at.unwrap_or_else(Utc::now), true),
        };

        Message {
            id: self.id,
            pending_id: self.pending_id,
            content: self.content,
            role: self.role,
            sent_at,
            timestamp_estimated,
            is_read: self.is_read || self.role == AuthorRole::Administrator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_admin_messages_are_always_read() {
        let msg = Message::builder(AuthorRole::Administrator)
            .content("Thanks, fixed")
            .read(false)
            .build();
        assert!(msg.is_read);
        assert!(!msg.is_unread());
    }

    #[test]
    fn test_correspondent_unread() {
        let msg = Message::builder(AuthorRole::Correspondent)
            .id(MessageId(1))
            .content("Help")
            .build();
        assert!(msg.is_unread());
    }

    #[test]
    fn test_missing_timestamp_is_flagged() {
        let fallback = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg = Message::builder(AuthorRole::Correspondent)
            .sent_at_or(None, fallback)
            .build();
        assert_eq!(msg.sent_at, fallback);
        assert!(msg.timestamp_estimated);

        let real = Utc.with_ymd_and_hms(2024, 4, 1, 8, 30, 0).unwrap();
        let msg = Message::builder(AuthorRole::Correspondent)
            .sent_at_or(Some(real), fallback)
            .build();
        assert_eq!(msg.sent_at, real);
        assert!(!msg.timestamp_estimated);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&AuthorRole::Administrator).unwrap();
        assert_eq!(json, "\"administrator\"");
    }
}
