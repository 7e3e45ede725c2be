//! Merges fetched reply sets into existing threads

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api::{AuthToken, InboxApi, normalize_reply};
use crate::error::InboxError;
use crate::models::{AuthorRole, CorrespondentId, Message, MessageId, Thread};
use crate::store::{ApplyOutcome, InboxStore};

/// How a fetched reply set is merged into a thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Append every fetched reply. Repeating a fetch duplicates the replies,
    /// so this mode is only kept for comparison with older clients.
    AppendAll,
    /// Drop the administrator messages held locally, then append the fetch.
    /// The fetch is the complete reply set, so repeating it is a no-op.
    #[default]
    ReplaceAdministrator,
}

/// What a merge changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Local messages removed before merging
    pub removed: usize,
    /// Fetched messages added to the thread
    pub added: usize,
    /// Fetched messages skipped as duplicates
    pub skipped: usize,
}

/// Replies fetched for one thread, tagged with the store generation
#[derive(Debug, Clone)]
pub struct ReplyBatch {
    pub correspondent_id: CorrespondentId,
    pub anchor_id: MessageId,
    pub generation: u64,
    pub replies: Vec<Message>,
}

/// Identity of a message the server sent without an ID.
///
/// Substituted timestamps change on every fetch, so they are left out.
type ContentKey = (AuthorRole, String, Option<DateTime<Utc>>);

fn content_key(message: &Message) -> ContentKey {
    let sent_at = (!message.timestamp_estimated).then_some(message.sent_at);
    (message.role, message.content.clone(), sent_at)
}

/// Merge `replies` into `thread` under `policy`, then restore order.
pub fn merge_replies(thread: &mut Thread, replies: Vec<Message>, policy: ReconcilePolicy) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    let incoming = match policy {
        ReconcilePolicy::AppendAll => replies,
        ReconcilePolicy::ReplaceAdministrator => {
            outcome.removed = thread.retain(|m| !m.is_admin());

            let mut seen: HashSet<MessageId> = thread.messages().iter().filter_map(|m| m.id).collect();
            let mut seen_unidentified: HashSet<ContentKey> = thread
                .messages()
                .iter()
                .filter(|m| m.id.is_none())
                .map(content_key)
                .collect();

            let mut fresh = Vec::with_capacity(replies.len());
            for reply in replies {
                let duplicate = match reply.id {
                    Some(id) => !seen.insert(id),
                    None => !seen_unidentified.insert(content_key(&reply)),
                };
                if duplicate {
                    outcome.skipped += 1;
                } else {
                    fresh.push(reply);
                }
            }
            fresh
        }
    };

    outcome.added = incoming.len();
    thread.extend(incoming);
    outcome
}

/// Fetch the replies of a thread's anchor message.
///
/// Returns `Ok(None)` without calling the collaborator when the thread has
/// no anchor.
pub fn fetch_reply_batch(
    api: &dyn InboxApi,
    token: &AuthToken,
    store: &InboxStore,
    id: CorrespondentId,
) -> Result<Option<ReplyBatch>, InboxError> {
    let thread = store.thread(id).ok_or(InboxError::ThreadNotFound(id))?;
    let Some(anchor_id) = thread.anchor_id else {
        debug!("Thread {} has no anchor, skipping reply fetch", id);
        return Ok(None);
    };

    let records = api
        .fetch_replies(token, anchor_id)
        .map_err(|e| InboxError::from_fetch("replies", &e))?;

    let now = Utc::now();
    let replies = records.into_iter().map(|r| normalize_reply(r, now)).collect();

    Ok(Some(ReplyBatch {
        correspondent_id: id,
        anchor_id,
        generation: store.generation(),
        replies,
    }))
}

/// Fetch and merge the replies of one thread.
///
/// A failed fetch leaves the thread untouched; the error is logged and
/// returned so callers can count it.
pub fn reconcile_thread(
    api: &dyn InboxApi,
    token: &AuthToken,
    store: &mut InboxStore,
    id: CorrespondentId,
    policy: ReconcilePolicy,
) -> Result<Option<MergeOutcome>, InboxError> {
    let batch = match fetch_reply_batch(api, token, store, id) {
        Ok(Some(batch)) => batch,
        Ok(None) => return Ok(None),
        Err(e) => {
            warn!("Failed to reconcile replies for correspondent {}: {}", id, e);
            return Err(e);
        }
    };

    match store.apply_replies(batch, policy) {
        ApplyOutcome::Applied(outcome) => {
            debug!(
                "Reconciled correspondent {}: +{} -{} (skipped {})",
                id, outcome.added, outcome.removed, outcome.skipped
            );
            Ok(Some(outcome))
        }
        ApplyOutcome::Stale | ApplyOutcome::MissingThread => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ReplyMessage;
    use crate::models::{Correspondent, PendingId};
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap()
    }

    fn user(id: i64, minutes: i64) -> Message {
        Message::builder(AuthorRole::Correspondent)
            .id(MessageId(id))
            .content(format!("question {}", id))
            .sent_at(base() + Duration::minutes(minutes))
            .build()
    }

    fn admin(id: i64, minutes: i64) -> Message {
        Message::builder(AuthorRole::Administrator)
            .id(MessageId(id))
            .content(format!("answer {}", id))
            .sent_at(base() + Duration::minutes(minutes))
            .build()
    }

    fn thread() -> Thread {
        Thread::new(
            Correspondent::new(CorrespondentId(1), "Jane", "jane@example.com"),
            vec![user(1, 0), user(2, 10)],
        )
    }

    fn ids(thread: &Thread) -> Vec<i64> {
        thread.messages().iter().filter_map(|m| m.id).map(|id| id.0).collect()
    }

    #[test]
    fn test_replace_is_idempotent() {
        let mut t = thread();
        let fetch = vec![admin(5, 5), admin(6, 20)];

        merge_replies(&mut t, fetch.clone(), ReconcilePolicy::ReplaceAdministrator);
        let once = t.messages().to_vec();

        let outcome = merge_replies(&mut t, fetch, ReconcilePolicy::ReplaceAdministrator);
        assert_eq!(t.messages(), once.as_slice());
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.added, 2);
        assert_eq!(ids(&t), vec![1, 5, 2, 6]);
        assert_eq!(t.last_activity_at(), base() + Duration::minutes(20));
    }

    #[test]
    fn test_append_all_duplicates_on_repeat() {
        // Known defect of the append-only mode: a repeated fetch doubles the replies
        let mut t = thread();
        let fetch = vec![admin(5, 5)];

        merge_replies(&mut t, fetch.clone(), ReconcilePolicy::AppendAll);
        merge_replies(&mut t, fetch, ReconcilePolicy::AppendAll);

        assert_eq!(ids(&t), vec![1, 5, 5, 2]);
    }

    #[test]
    fn test_replace_drops_optimistic_messages() {
        let mut t = thread();
        t.push(
            Message::builder(AuthorRole::Administrator)
                .pending_id(PendingId(1))
                .content("draft")
                .sent_at(base() + Duration::minutes(30))
                .build(),
        );

        merge_replies(&mut t, vec![admin(7, 31)], ReconcilePolicy::ReplaceAdministrator);

        assert!(t.messages().iter().all(|m| !m.is_pending()));
        assert_eq!(ids(&t), vec![1, 2, 7]);
    }

    #[test]
    fn test_replace_skips_known_correspondent_messages() {
        let mut t = thread();
        // Reply listing may echo correspondent follow-ups already in the thread
        let fetch = vec![user(2, 10), user(3, 40), admin(8, 15), admin(8, 15)];

        let outcome = merge_replies(&mut t, fetch, ReconcilePolicy::ReplaceAdministrator);

        assert_eq!(outcome.skipped, 2);
        assert_eq!(ids(&t), vec![1, 2, 8, 3]);
        assert_eq!(t.unread_count(), 3);
    }

    #[test]
    fn test_replace_is_idempotent_for_unidentified_messages() {
        let mut t = thread();
        let follow_up = Message::builder(AuthorRole::Correspondent)
            .content("follow-up")
            .sent_at(base() + Duration::minutes(25))
            .build();
        let fetch = vec![admin(5, 5), follow_up];

        merge_replies(&mut t, fetch.clone(), ReconcilePolicy::ReplaceAdministrator);
        let once = t.message_count();
        let unread_once = t.unread_count();

        let outcome = merge_replies(&mut t, fetch, ReconcilePolicy::ReplaceAdministrator);

        assert_eq!(t.message_count(), once);
        assert_eq!(t.unread_count(), unread_once);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_replace_ignores_substituted_timestamps_when_collapsing() {
        let mut t = thread();
        let record = ReplyMessage {
            id: None,
            content: "sent from my phone".to_string(),
            role: AuthorRole::Correspondent,
            created_at: None,
            is_read: false,
        };

        let first = vec![normalize_reply(record.clone(), base() + Duration::hours(1))];
        let second = vec![normalize_reply(record, base() + Duration::hours(2))];
        merge_replies(&mut t, first, ReconcilePolicy::ReplaceAdministrator);
        merge_replies(&mut t, second, ReconcilePolicy::ReplaceAdministrator);

        assert_eq!(t.message_count(), 3);
        assert_eq!(t.unread_count(), 3);
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: ReconcilePolicy = serde_json::from_str("\"append_all\"").unwrap();
        assert_eq!(policy, ReconcilePolicy::AppendAll);
        assert_eq!(ReconcilePolicy::default(), ReconcilePolicy::ReplaceAdministrator);
    }
}
