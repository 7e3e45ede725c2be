//! Thread model representing the conversation with one correspondent

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Correspondent, CorrespondentId, Message, MessageId, PendingId};

/// A thread aggregates every message exchanged with one correspondent.
///
/// The message sequence is private so that every mutation goes through a
/// method that re-sorts it and refreshes `last_activity_at`. Unread counts
/// are computed from the messages on demand and never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Correspondent this thread belongs to (cached from the first message seen)
    pub correspondent: Correspondent,
    /// Message used as the key for fetching and posting replies
    pub anchor_id: Option<MessageId>,
    messages: Vec<Message>,
    last_activity_at: DateTime<Utc>,
}

impl Thread {
    /// Create a thread from its initial messages.
    ///
    /// The anchor is the chronologically last message that carries a server ID.
    pub fn new(correspondent: Correspondent, messages: Vec<Message>) -> Self {
        let mut thread = Self {
            correspondent,
            anchor_id: None,
            messages,
            last_activity_at: DateTime::<Utc>::MIN_UTC,
        };
        thread.resort();
        thread.anchor_id = thread.messages.iter().rev().find_map(|m| m.id);
        thread
    }

    pub fn id(&self) -> CorrespondentId {
        self.correspondent.id
    }

    /// Messages in chronological order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Timestamp of the most recent message
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    /// Number of unread correspondent-authored messages
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_unread()).count()
    }

    /// Whether the administrator has replied at least once
    pub fn has_admin_reply(&self) -> bool {
        self.messages.iter().any(Message::is_admin)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == Some(id))
    }

    /// IDs of unread correspondent messages, oldest first
    pub fn unread_message_ids(&self) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|m| m.is_unread())
            .filter_map(|m| m.id)
            .collect()
    }

    /// Point the anchor at the latest identified correspondent message
    pub fn reanchor(&mut self) {
        self.anchor_id = self
            .messages
            .iter()
            .rev()
            .filter(|m| !m.is_admin())
            .find_map(|m| m.id);
    }

    /// Append a message and restore chronological order
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.resort();
    }

    /// Append several messages and restore chronological order
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
        self.resort();
    }

    /// Keep only the messages matching `keep`; returns how many were removed
    pub fn retain(&mut self, keep: impl FnMut(&Message) -> bool) -> usize {
        let before = self.messages.len();
        self.messages.retain(keep);
        let removed = before - self.messages.len();
        if removed > 0 {
            self.resort();
        }
        removed
    }

    /// Remove exactly the optimistic message with the given pending ID
    pub fn remove_pending(&mut self, pending_id: PendingId) -> Option<Message> {
        let pos = self
            .messages
            .iter()
            .position(|m| m.pending_id == Some(pending_id))?;
        let removed = self.messages.remove(pos);
        self.resort();
        Some(removed)
    }

    /// Flip the read flag of a message; returns false if no such message
    pub fn set_read(&mut self, id: MessageId) -> bool {
        match self.messages.iter_mut().find(|m| m.id == Some(id)) {
            Some(msg) => {
                msg.mark_read();
                true
            }
            None => false,
        }
    }

    fn resort(&mut self) {
        // Stable sort keeps arrival order for equal timestamps
        self.messages.sort_by_key(|m| m.sent_at);
        self.last_activity_at = self
            .messages
            .last()
            .map_or(DateTime::<Utc>::MIN_UTC, |last| last.sent_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorRole;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn user_msg(id: i64, minutes: i64) -> Message {
        Message::builder(AuthorRole::Correspondent)
            .id(MessageId(id))
            .content(format!("message {}", id))
            .sent_at(base() + Duration::minutes(minutes))
            .build()
    }

    fn correspondent() -> Correspondent {
        Correspondent::new(CorrespondentId(1), "Jane", "jane@example.com")
    }

    #[test]
    fn test_new_sorts_and_sets_anchor() {
        let thread = Thread::new(correspondent(), vec![user_msg(3, 30), user_msg(1, 10), user_msg(2, 20)]);

        let ids: Vec<_> = thread.messages().iter().map(|m| m.id.unwrap().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(thread.anchor_id, Some(MessageId(3)));
        assert_eq!(thread.last_activity_at(), base() + Duration::minutes(30));
        assert_eq!(thread.unread_count(), 3);
    }

    #[test]
    fn test_push_keeps_order() {
        let mut thread = Thread::new(correspondent(), vec![user_msg(1, 10), user_msg(2, 20)]);
        thread.push(user_msg(5, 15));

        let ids: Vec<_> = thread.messages().iter().map(|m| m.id.unwrap().0).collect();
        assert_eq!(ids, vec![1, 5, 2]);
        assert_eq!(thread.last_activity_at(), base() + Duration::minutes(20));
    }

    #[test]
    fn test_unread_tracks_read_flags() {
        let mut thread = Thread::new(correspondent(), vec![user_msg(1, 10), user_msg(2, 20)]);
        assert!(thread.set_read(MessageId(1)));
        assert!(!thread.set_read(MessageId(99)));
        assert_eq!(thread.unread_count(), 1);
        assert_eq!(thread.unread_message_ids(), vec![MessageId(2)]);
    }

    #[test]
    fn test_remove_pending_only_removes_that_message() {
        let mut thread = Thread::new(correspondent(), vec![user_msg(1, 10)]);
        let optimistic = Message::builder(AuthorRole::Administrator)
            .pending_id(PendingId(9))
            .content("On it")
            .sent_at(base() + Duration::minutes(40))
            .build();
        thread.push(optimistic);
        assert_eq!(thread.last_activity_at(), base() + Duration::minutes(40));

        assert!(thread.remove_pending(PendingId(8)).is_none());
        let removed = thread.remove_pending(PendingId(9)).unwrap();
        assert_eq!(removed.content, "On it");
        assert_eq!(thread.message_count(), 1);
        assert_eq!(thread.last_activity_at(), base() + Duration::minutes(10));
    }

    #[test]
    fn test_emptied_thread_resets_activity() {
        let mut thread = Thread::new(correspondent(), vec![user_msg(1, 10), user_msg(2, 20)]);

        assert_eq!(thread.retain(|_| false), 2);
        assert_eq!(thread.message_count(), 0);
        assert_eq!(thread.last_activity_at(), DateTime::<Utc>::MIN_UTC);
    }
}
