//! Inbox load implementation

use chrono::Utc;
use log::{info, warn};
use std::time::Instant;

use crate::api::{AuthToken, InboxApi};
use crate::error::InboxError;
use crate::store::InboxStore;
use crate::threads::{ReconcilePolicy, build_threads, reconcile_thread};

/// Options for a load cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// How fetched replies are merged into threads
    pub policy: ReconcilePolicy,
    /// Skip the per-thread reply fetches (threads hold inbox messages only)
    pub skip_replies: bool,
}

/// Statistics from a load cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    /// Store generation produced by this load
    pub generation: u64,
    /// Messages returned by the inbox listing
    pub messages_fetched: usize,
    /// Messages dropped for lacking a correspondent
    pub messages_discarded: usize,
    /// Messages whose timestamp was substituted
    pub estimated_timestamps: usize,
    /// Threads built
    pub threads: usize,
    /// Reply messages merged into threads
    pub replies_merged: usize,
    /// Threads whose reply fetch failed
    pub reply_errors: usize,
    /// Unread messages after the load
    pub unread: usize,
    /// Duration of the load
    pub duration_ms: u64,
}

/// Load the inbox into `store`, replacing whatever it held.
///
/// Auth and listing failures are returned and leave the store unchanged.
/// Reply fetch failures for individual threads are logged and counted;
/// those threads keep their inbox messages only.
pub fn load_inbox(
    api: &dyn InboxApi,
    token: &AuthToken,
    store: &mut InboxStore,
    options: &LoadOptions,
) -> Result<LoadStats, InboxError> {
    let start = Instant::now();
    let mut stats = LoadStats::default();

    if token.is_blank() {
        return Err(InboxError::Auth {
            message: "No auth token available".to_string(),
        });
    }

    // 1. Fetch the inbox listing
    let records = api
        .fetch_inbox_messages(token)
        .map_err(|e| InboxError::from_fetch("inbox", &e))?;
    stats.messages_fetched = records.len();

    // 2. Group into threads and swap them in
    let outcome = build_threads(records, Utc::now());
    stats.messages_discarded = outcome.stats.discarded;
    stats.estimated_timestamps = outcome.stats.estimated_timestamps;
    stats.threads = outcome.threads.len();
    stats.generation = store.replace_all(outcome.threads);

    if stats.estimated_timestamps > 0 {
        warn!(
            "{} inbox messages had no timestamp and were placed at load time",
            stats.estimated_timestamps
        );
    }

    // 3. Reconcile replies one thread at a time
    if !options.skip_replies {
        for id in store.thread_ids() {
            match reconcile_thread(api, token, store, id, options.policy) {
                Ok(Some(merge)) => stats.replies_merged += merge.added,
                Ok(None) => {}
                Err(_) => stats.reply_errors += 1,
            }
        }
    }

    stats.unread = store.global_unread();
    stats.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Loaded inbox: {} threads, {} unread, {} replies merged, {} reply errors ({}ms)",
        stats.threads, stats.unread, stats.replies_merged, stats.reply_errors, stats.duration_ms
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{InboxMessage, ReplyMessage};
    use crate::api::{ApiOperation, FailureMode, InMemoryInboxApi};
    use crate::models::{AuthorRole, CorrespondentId, MessageId};
    use chrono::Duration;

    fn inbox_message(id: i64, correspondent: Option<i64>, age_minutes: i64) -> InboxMessage {
        InboxMessage {
            id: Some(MessageId(id)),
            correspondent_id: correspondent.map(CorrespondentId),
            sender: None,
            content: format!("question {}", id),
            created_at: Some(Utc::now() - Duration::minutes(age_minutes)),
            is_read: false,
        }
    }

    fn admin_reply(id: i64, age_minutes: i64) -> ReplyMessage {
        ReplyMessage {
            id: Some(MessageId(id)),
            content: format!("answer {}", id),
            role: AuthorRole::Administrator,
            created_at: Some(Utc::now() - Duration::minutes(age_minutes)),
            is_read: true,
        }
    }

    fn setup_api() -> InMemoryInboxApi {
        let api = InMemoryInboxApi::new("token");
        api.insert_message(inbox_message(1, Some(10), 60)).unwrap();
        api.insert_message(inbox_message(2, Some(20), 50)).unwrap();
        api.insert_message(inbox_message(3, None, 40)).unwrap();
        api.insert_reply(MessageId(1), admin_reply(100, 30)).unwrap();
        api
    }

    #[test]
    fn test_load_builds_and_reconciles() {
        let api = setup_api();
        let mut store = InboxStore::new();

        let stats = load_inbox(&api, &AuthToken::new("token"), &mut store, &LoadOptions::default()).unwrap();

        assert_eq!(stats.messages_fetched, 3);
        assert_eq!(stats.messages_discarded, 1);
        assert_eq!(stats.threads, 2);
        assert_eq!(stats.replies_merged, 1);
        assert_eq!(stats.unread, 2);
        assert_eq!(stats.generation, 1);
        assert!(store.thread(CorrespondentId(10)).unwrap().has_admin_reply());
    }

    #[test]
    fn test_blank_token_is_auth_error_without_calls() {
        let api = setup_api();
        let mut store = InboxStore::new();

        let err = load_inbox(&api, &AuthToken::new(""), &mut store, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, InboxError::Auth { .. }));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_rejected_token_is_auth_error() {
        let api = setup_api();
        let mut store = InboxStore::new();

        let err = load_inbox(&api, &AuthToken::new("wrong"), &mut store, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, InboxError::Auth { .. }));
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_listing_failure_keeps_previous_state() {
        let api = setup_api();
        let token = AuthToken::new("token");
        let mut store = InboxStore::new();
        load_inbox(&api, &token, &mut store, &LoadOptions::default()).unwrap();

        api.fail(ApiOperation::FetchInbox, FailureMode::Error);
        let err = load_inbox(&api, &token, &mut store, &LoadOptions::default()).unwrap_err();

        assert!(matches!(err, InboxError::Fetch { .. }));
        assert_eq!(store.generation(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reply_failure_is_counted_not_fatal() {
        let api = setup_api();
        api.fail_for(ApiOperation::FetchReplies, MessageId(1), FailureMode::Error);
        let mut store = InboxStore::new();

        let stats = load_inbox(&api, &AuthToken::new("token"), &mut store, &LoadOptions::default()).unwrap();

        assert_eq!(stats.reply_errors, 1);
        assert_eq!(stats.threads, 2);
        assert!(!store.thread(CorrespondentId(10)).unwrap().has_admin_reply());
    }

    #[test]
    fn test_skip_replies() {
        let api = setup_api();
        let mut store = InboxStore::new();
        let options = LoadOptions {
            skip_replies: true,
            ..LoadOptions::default()
        };

        let stats = load_inbox(&api, &AuthToken::new("token"), &mut store, &options).unwrap();
        assert_eq!(stats.replies_merged, 0);
        assert_eq!(api.call_count(ApiOperation::FetchReplies), 0);
    }
}
