//! Collaborator payload normalization
//!
//! Converts API records to inbox domain models.

use chrono::{DateTime, Utc};

use super::types::{InboxMessage, ReplyMessage, SenderInfo};
use crate::models::{AuthorRole, CorrespondentId, Message};

/// Normalize an inbox listing record.
///
/// Returns `None` when the record has no correspondent ID. A missing
/// timestamp is replaced by `now` and flagged as estimated.
pub fn normalize_inbox_message(
    record: InboxMessage,
    now: DateTime<Utc>,
) -> Option<(CorrespondentId, Option<SenderInfo>, Message)> {
    let correspondent_id = record.correspondent_id?;

    let message = Message::builder(AuthorRole::Correspondent)
        .maybe_id(record.id)
        .content(record.content)
        .sent_at_or(record.created_at, now)
        .read(record.is_read)
        .build();

    Some((correspondent_id, record.sender, message))
}

/// Normalize a reply listing record
pub fn normalize_reply(record: ReplyMessage, now: DateTime<Utc>) -> Message {
    Message::builder(record.role)
        .maybe_id(record.id)
        .content(record.content)
        .sent_at_or(record.created_at, now)
        .read(record.is_read)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageId;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_inbox_record_without_correspondent_is_dropped() {
        let record = InboxMessage {
            id: Some(MessageId(1)),
            correspondent_id: None,
            sender: None,
            content: "orphan".to_string(),
            created_at: None,
            is_read: false,
        };
        assert!(normalize_inbox_message(record, now()).is_none());
    }

    #[test]
    fn test_inbox_record_from_json() {
        let json = r#"{
            "id": 17,
            "correspondentId": 4,
            "sender": { "name": "Ana", "email": "ana@example.com" },
            "content": "My order is late",
            "createdAt": "2024-05-30T10:00:00Z",
            "isRead": false
        }"#;
        let record: InboxMessage = serde_json::from_str(json).unwrap();
        let (cid, sender, msg) = normalize_inbox_message(record, now()).unwrap();

        assert_eq!(cid, CorrespondentId(4));
        assert_eq!(sender.unwrap().name.as_deref(), Some("Ana"));
        assert_eq!(msg.id, Some(MessageId(17)));
        assert!(msg.is_unread());
        assert!(!msg.timestamp_estimated);
    }

    #[test]
    fn test_admin_reply_is_read() {
        let record = ReplyMessage {
            id: Some(MessageId(30)),
            content: "Shipped today".to_string(),
            role: AuthorRole::Administrator,
            created_at: None,
            is_read: false,
        };
        let msg = normalize_reply(record, now());
        assert!(msg.is_admin());
        assert!(msg.is_read);
        assert_eq!(msg.sent_at, now());
        assert!(msg.timestamp_estimated);
    }
}
