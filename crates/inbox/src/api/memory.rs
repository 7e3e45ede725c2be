//! In-memory collaborator implementation
//!
//! Serves an inbox held in memory. Used by the tests, and by the console
//! to replay a snapshot file without a live backend.

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::traits::{AuthRequiredError, AuthToken, InboxApi};
use super::types::{InboxMessage, ReplyMessage};
use crate::models::{AuthorRole, MessageId};

/// Replies attached to one anchor message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySet {
    pub anchor_id: MessageId,
    #[serde(default)]
    pub replies: Vec<ReplyMessage>,
}

/// Serializable contents of an inbox backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboxSnapshot {
    #[serde(default)]
    pub messages: Vec<InboxMessage>,
    #[serde(default)]
    pub replies: Vec<ReplySet>,
}

/// Collaborator operations, used for call logs and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    FetchInbox,
    FetchReplies,
    SendReply,
    MarkRead,
    Delete,
}

/// How an injected failure manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// The call returns an error
    Error,
    /// The call succeeds but reports `false`
    Rejected,
}

/// One recorded collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub operation: ApiOperation,
    pub target: Option<MessageId>,
}

struct FailureRule {
    operation: ApiOperation,
    target: Option<MessageId>,
    mode: FailureMode,
}

/// In-memory implementation of InboxApi
///
/// Uses collections protected by RwLocks for thread-safe access.
pub struct InMemoryInboxApi {
    token: AuthToken,
    messages: RwLock<Vec<InboxMessage>>,
    replies: RwLock<HashMap<MessageId, Vec<ReplyMessage>>>,
    failures: RwLock<Vec<FailureRule>>,
    calls: RwLock<Vec<ApiCall>>,
    next_id: AtomicI64,
}

impl InMemoryInboxApi {
    /// Create an empty backend that accepts `token`
    pub fn new(token: impl Into<AuthToken>) -> Self {
        Self::from_snapshot(token, InboxSnapshot::default())
    }

    /// Create a backend serving the given snapshot
    pub fn from_snapshot(token: impl Into<AuthToken>, snapshot: InboxSnapshot) -> Self {
        let max_id = snapshot
            .messages
            .iter()
            .filter_map(|m| m.id)
            .chain(
                snapshot
                    .replies
                    .iter()
                    .flat_map(|set| set.replies.iter().filter_map(|r| r.id)),
            )
            .map(|id| id.0)
            .max()
            .unwrap_or(0);

        let mut replies: HashMap<MessageId, Vec<ReplyMessage>> = HashMap::new();
        for set in snapshot.replies {
            replies.entry(set.anchor_id).or_default().extend(set.replies);
        }

        Self {
            token: token.into(),
            messages: RwLock::new(snapshot.messages),
            replies: RwLock::new(replies),
            failures: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(max_id + 1),
        }
    }

    /// Load a snapshot JSON file
    pub fn from_snapshot_file(token: impl Into<AuthToken>, path: &Path) -> Result<Self> {
        let snapshot: InboxSnapshot = config::load_json_file(path)?;
        Ok(Self::from_snapshot(token, snapshot))
    }

    /// Current backend contents
    pub fn snapshot(&self) -> Result<InboxSnapshot> {
        let messages = read(&self.messages)?.clone();
        let mut replies: Vec<ReplySet> = read(&self.replies)?
            .iter()
            .map(|(anchor_id, replies)| ReplySet {
                anchor_id: *anchor_id,
                replies: replies.clone(),
            })
            .collect();
        replies.sort_by_key(|set| set.anchor_id);
        Ok(InboxSnapshot { messages, replies })
    }

    /// Add a message to the inbox listing
    pub fn insert_message(&self, message: InboxMessage) -> Result<()> {
        if let Some(id) = message.id {
            self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
        }
        write(&self.messages)?.push(message);
        Ok(())
    }

    /// Attach a reply to an anchor message
    pub fn insert_reply(&self, anchor: MessageId, reply: ReplyMessage) -> Result<()> {
        if let Some(id) = reply.id {
            self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
        }
        write(&self.replies)?.entry(anchor).or_default().push(reply);
        Ok(())
    }

    /// Make every call of `operation` fail
    pub fn fail(&self, operation: ApiOperation, mode: FailureMode) {
        self.push_failure(operation, None, mode);
    }

    /// Make calls of `operation` targeting `id` fail
    pub fn fail_for(&self, operation: ApiOperation, id: MessageId, mode: FailureMode) {
        self.push_failure(operation, Some(id), mode);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.write() {
            failures.clear();
        }
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded calls of one operation
    pub fn call_count(&self, operation: ApiOperation) -> usize {
        self.calls().iter().filter(|c| c.operation == operation).count()
    }

    fn push_failure(&self, operation: ApiOperation, target: Option<MessageId>, mode: FailureMode) {
        if let Ok(mut failures) = self.failures.write() {
            failures.push(FailureRule {
                operation,
                target,
                mode,
            });
        }
    }

    /// Record the call, check the token, and apply injected failures.
    ///
    /// Returns `Ok(false)` when a `Rejected` failure applies.
    fn begin(&self, token: &AuthToken, operation: ApiOperation, target: Option<MessageId>) -> Result<bool> {
        write(&self.calls)?.push(ApiCall { operation, target });

        if token != &self.token {
            return Err(AuthRequiredError.into());
        }

        let failures = read(&self.failures)?;
        let rule = failures
            .iter()
            .find(|r| r.operation == operation && (r.target.is_none() || r.target == target));
        match rule.map(|r| r.mode) {
            Some(FailureMode::Error) => bail!("Simulated {:?} failure", operation),
            Some(FailureMode::Rejected) => Ok(false),
            None => Ok(true),
        }
    }
}

impl InboxApi for InMemoryInboxApi {
    fn fetch_inbox_messages(&self, token: &AuthToken) -> Result<Vec<InboxMessage>> {
        if !self.begin(token, ApiOperation::FetchInbox, None)? {
            bail!("Inbox listing rejected");
        }
        Ok(read(&self.messages)?.clone())
    }

    fn fetch_replies(&self, token: &AuthToken, anchor: MessageId) -> Result<Vec<ReplyMessage>> {
        if !self.begin(token, ApiOperation::FetchReplies, Some(anchor))? {
            bail!("Reply listing rejected for message {}", anchor);
        }
        Ok(read(&self.replies)?.get(&anchor).cloned().unwrap_or_default())
    }

    fn send_reply(&self, token: &AuthToken, anchor: MessageId, text: &str) -> Result<bool> {
        if !self.begin(token, ApiOperation::SendReply, Some(anchor))? {
            return Ok(false);
        }

        let reply = ReplyMessage {
            id: Some(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))),
            content: text.to_string(),
            role: AuthorRole::Administrator,
            created_at: Some(Utc::now()),
            is_read: true,
        };
        write(&self.replies)?.entry(anchor).or_default().push(reply);
        Ok(true)
    }

    fn mark_message_read(&self, token: &AuthToken, id: MessageId) -> Result<bool> {
        if !self.begin(token, ApiOperation::MarkRead, Some(id))? {
            return Ok(false);
        }

        let mut found = false;
        for msg in write(&self.messages)?.iter_mut().filter(|m| m.id == Some(id)) {
            msg.is_read = true;
            found = true;
        }
        for reply in write(&self.replies)?
            .values_mut()
            .flat_map(|r| r.iter_mut())
            .filter(|r| r.id == Some(id))
        {
            reply.is_read = true;
            found = true;
        }
        Ok(found)
    }

    fn delete_message(&self, token: &AuthToken, id: MessageId) -> Result<bool> {
        if !self.begin(token, ApiOperation::Delete, Some(id))? {
            return Ok(false);
        }

        let mut messages = write(&self.messages)?;
        let before = messages.len();
        messages.retain(|m| m.id != Some(id));
        let removed = messages.len() != before;

        // Replies hang off their anchor
        write(&self.replies)?.remove(&id);
        Ok(removed)
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("In-memory inbox lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("In-memory inbox lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorrespondentId;

    fn inbox_message(id: i64, correspondent: i64) -> InboxMessage {
        InboxMessage {
            id: Some(MessageId(id)),
            correspondent_id: Some(CorrespondentId(correspondent)),
            sender: None,
            content: format!("message {}", id),
            created_at: Some(Utc::now()),
            is_read: false,
        }
    }

    #[test]
    fn test_wrong_token_is_auth_error() {
        let api = InMemoryInboxApi::new("good");
        let err = api.fetch_inbox_messages(&AuthToken::new("bad")).unwrap_err();
        assert!(err.downcast_ref::<AuthRequiredError>().is_some());
    }

    #[test]
    fn test_send_reply_assigns_fresh_ids() {
        let api = InMemoryInboxApi::new("t");
        let token = AuthToken::new("t");
        api.insert_message(inbox_message(10, 1)).unwrap();

        assert!(api.send_reply(&token, MessageId(10), "hello").unwrap());
        assert!(api.send_reply(&token, MessageId(10), "again").unwrap());

        let replies = api.fetch_replies(&token, MessageId(10)).unwrap();
        let ids: Vec<_> = replies.iter().map(|r| r.id.unwrap().0).collect();
        assert_eq!(ids, vec![11, 12]);
        assert!(replies.iter().all(|r| r.role == AuthorRole::Administrator));
    }

    #[test]
    fn test_targeted_failure() {
        let api = InMemoryInboxApi::new("t");
        let token = AuthToken::new("t");
        api.insert_message(inbox_message(1, 1)).unwrap();
        api.insert_message(inbox_message(2, 1)).unwrap();
        api.fail_for(ApiOperation::MarkRead, MessageId(1), FailureMode::Rejected);

        assert!(!api.mark_message_read(&token, MessageId(1)).unwrap());
        assert!(api.mark_message_read(&token, MessageId(2)).unwrap());
        assert_eq!(api.call_count(ApiOperation::MarkRead), 2);

        api.clear_failures();
        assert!(api.mark_message_read(&token, MessageId(1)).unwrap());
    }

    #[test]
    fn test_delete_removes_message_and_replies() {
        let api = InMemoryInboxApi::new("t");
        let token = AuthToken::new("t");
        api.insert_message(inbox_message(5, 2)).unwrap();
        api.send_reply(&token, MessageId(5), "reply").unwrap();

        assert!(api.delete_message(&token, MessageId(5)).unwrap());
        assert!(!api.delete_message(&token, MessageId(5)).unwrap());
        assert!(api.fetch_inbox_messages(&token).unwrap().is_empty());
        assert!(api.fetch_replies(&token, MessageId(5)).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.json");
        let json = r#"{
            "messages": [
                { "id": 1, "correspondentId": 3, "content": "Hi", "createdAt": "2024-01-01T10:00:00Z" }
            ],
            "replies": [
                { "anchorId": 1, "replies": [
                    { "id": 2, "content": "Hello", "role": "administrator", "createdAt": "2024-01-01T11:00:00Z" }
                ] }
            ]
        }"#;
        std::fs::write(&path, json).unwrap();

        let api = InMemoryInboxApi::from_snapshot_file("t", &path).unwrap();
        let snapshot = api.snapshot().unwrap();
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.replies[0].replies[0].content, "Hello");

        // New IDs continue after the highest one in the file
        let token = AuthToken::new("t");
        api.send_reply(&token, MessageId(1), "more").unwrap();
        let replies = api.fetch_replies(&token, MessageId(1)).unwrap();
        assert_eq!(replies.last().unwrap().id, Some(MessageId(3)));
    }
}
