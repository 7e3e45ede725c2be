//! Action handler for inbox operations
//!
//! Coordinates between the collaborator API and the local thread map.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::api::{AuthToken, InboxApi};
use crate::error::{ActionKind, InboxError};
use crate::models::{AuthorRole, CorrespondentId, Message, MessageId, PendingId};
use crate::store::InboxStore;
use crate::sync::{LoadOptions, LoadStats, load_inbox};
use crate::threads::{ReconcilePolicy, reconcile_thread};

/// Lifecycle of an optimistic action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Applied locally, awaiting server confirmation
    Pending,
    /// Confirmed by the server
    Confirmed,
    /// Rejected by the server and undone locally
    RolledBack,
}

/// An optimistic reply appended locally but not yet sent
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub correspondent_id: CorrespondentId,
    pub pending_id: PendingId,
    pub anchor_id: MessageId,
    pub text: String,
    pub generation: u64,
    pub status: ActionStatus,
}

/// Final state of a reply after the server answered
#[derive(Debug, Clone)]
pub struct ReplyAttempt {
    pub pending_id: PendingId,
    pub status: ActionStatus,
    /// Unread messages marked read after a confirmed send
    pub marked_read: usize,
    /// Why the reply was rolled back
    pub error: Option<InboxError>,
}

/// Result of marking a thread read
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkReadOutcome {
    /// Messages confirmed read by the server and flipped locally
    pub marked: usize,
    /// Messages the server did not confirm (still unread locally)
    pub failed: Vec<MessageId>,
    /// Unread messages without a server ID, which cannot be marked
    pub unmarkable: usize,
}

impl MarkReadOutcome {
    /// The failure to report to the user, if any message was left unread
    pub fn error(&self) -> Option<InboxError> {
        let left = self.failed.len() + self.unmarkable;
        if left == 0 {
            None
        } else {
            Some(InboxError::action(
                ActionKind::MarkRead,
                format!("{} message(s) could not be marked as read", left),
            ))
        }
    }
}

/// Handler for inbox actions like replying, marking read and deleting
///
/// Server state is the source of truth: local read flags and deletions are
/// applied only after the server confirms them. Replies are the exception,
/// appended optimistically and removed again if the send fails.
pub struct ActionHandler {
    api: Arc<dyn InboxApi>,
    token: AuthToken,
}

impl ActionHandler {
    /// Create a new action handler
    pub fn new(api: Arc<dyn InboxApi>, token: AuthToken) -> Self {
        Self { api, token }
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Rebuild the whole inbox from the server
    pub fn refresh(&self, store: &mut InboxStore, options: &LoadOptions) -> Result<LoadStats, InboxError> {
        load_inbox(self.api.as_ref(), &self.token, store, options)
    }

    /// Fetch and merge the replies of one thread
    pub fn reconcile(
        &self,
        store: &mut InboxStore,
        id: CorrespondentId,
        policy: ReconcilePolicy,
    ) -> Result<usize, InboxError> {
        let outcome = reconcile_thread(self.api.as_ref(), &self.token, store, id, policy)?;
        Ok(outcome.map(|o| o.added).unwrap_or(0))
    }

    /// Mark every unread message of a thread as read
    ///
    /// Messages are marked one at a time. A message is flipped locally only
    /// after the server confirms it; failures are logged and do not stop
    /// the remaining messages.
    pub fn mark_thread_read(
        &self,
        store: &mut InboxStore,
        id: CorrespondentId,
    ) -> Result<MarkReadOutcome, InboxError> {
        let thread = store.thread(id).ok_or(InboxError::ThreadNotFound(id))?;
        let unread = thread.unread_message_ids();

        let mut outcome = MarkReadOutcome {
            unmarkable: thread.unread_count() - unread.len(),
            ..MarkReadOutcome::default()
        };
        if outcome.unmarkable > 0 {
            warn!(
                "{} unread message(s) for correspondent {} have no server ID",
                outcome.unmarkable, id
            );
        }
        if unread.is_empty() {
            return Ok(outcome);
        }

        info!("Marking {} message(s) read for correspondent {}", unread.len(), id);

        for msg_id in unread {
            match self.api.mark_message_read(&self.token, msg_id) {
                Ok(true) => {
                    if let Some(thread) = store.thread_mut(id) {
                        thread.set_read(msg_id);
                    }
                    outcome.marked += 1;
                }
                Ok(false) => {
                    warn!("Server did not confirm read for message {}", msg_id);
                    outcome.failed.push(msg_id);
                }
                Err(e) => {
                    warn!("Failed to mark message {} read: {:#}", msg_id, e);
                    outcome.failed.push(msg_id);
                }
            }
        }

        Ok(outcome)
    }

    /// Send a reply, appending it optimistically first
    ///
    /// Returns `Ok(None)` for blank text without touching anything.
    pub fn send_reply(
        &self,
        store: &mut InboxStore,
        id: CorrespondentId,
        text: &str,
    ) -> Result<Option<ReplyAttempt>, InboxError> {
        match self.begin_reply(store, id, text)? {
            Some(pending) => Ok(Some(self.complete_reply(store, pending))),
            None => Ok(None),
        }
    }

    /// Append an optimistic administrator message to a thread
    pub fn begin_reply(
        &self,
        store: &mut InboxStore,
        id: CorrespondentId,
        text: &str,
    ) -> Result<Option<PendingReply>, InboxError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let anchor_id = store
            .thread(id)
            .ok_or(InboxError::ThreadNotFound(id))?
            .anchor_id
            .ok_or_else(|| InboxError::action(ActionKind::SendReply, "Thread has no message to reply to"))?;

        let pending_id = store.next_pending_id();
        let message = Message::builder(AuthorRole::Administrator)
            .pending_id(pending_id)
            .content(text)
            .sent_at(Utc::now())
            .build();

        if let Some(thread) = store.thread_mut(id) {
            thread.push(message);
        }

        debug!("Optimistic reply {} added to correspondent {}", pending_id, id);

        Ok(Some(PendingReply {
            correspondent_id: id,
            pending_id,
            anchor_id,
            text: text.to_string(),
            generation: store.generation(),
            status: ActionStatus::Pending,
        }))
    }

    /// Send a pending reply and confirm or roll it back
    ///
    /// On success the thread is reconciled so the server copy replaces the
    /// optimistic one, and the messages being answered are marked read. On
    /// failure exactly the optimistic message is removed. Nothing local is
    /// touched if the store was rebuilt while the send was in flight.
    pub fn complete_reply(&self, store: &mut InboxStore, pending: PendingReply) -> ReplyAttempt {
        let id = pending.correspondent_id;
        let result = self.api.send_reply(&self.token, pending.anchor_id, &pending.text);
        let current = store.generation() == pending.generation;

        let failure = match result {
            Ok(true) => None,
            Ok(false) => Some("Server rejected the reply".to_string()),
            Err(e) => Some(format!("{:#}", e)),
        };

        if let Some(message) = failure {
            warn!("Reply to correspondent {} failed: {}", id, message);
            if current && let Some(thread) = store.thread_mut(id) {
                thread.remove_pending(pending.pending_id);
            }
            return ReplyAttempt {
                pending_id: pending.pending_id,
                status: ActionStatus::RolledBack,
                marked_read: 0,
                error: Some(InboxError::action(ActionKind::SendReply, message)),
            };
        }

        info!("Reply to correspondent {} confirmed", id);

        let mut marked_read = 0;
        if current {
            if reconcile_thread(
                self.api.as_ref(),
                &self.token,
                store,
                id,
                ReconcilePolicy::ReplaceAdministrator,
            )
            .is_err()
            {
                debug!("Keeping optimistic reply {} until the next reconciliation", pending.pending_id);
            }

            match self.mark_thread_read(store, id) {
                Ok(outcome) => marked_read = outcome.marked,
                Err(e) => warn!("Could not mark correspondent {} read after reply: {}", id, e),
            }
        }

        ReplyAttempt {
            pending_id: pending.pending_id,
            status: ActionStatus::Confirmed,
            marked_read,
            error: None,
        }
    }

    /// Delete a thread
    ///
    /// Every correspondent message is deleted on the server one at a time.
    /// The thread is removed once all deletions succeed; otherwise only the
    /// confirmed deletions are applied locally and an error is returned.
    pub fn delete_thread(&self, store: &mut InboxStore, id: CorrespondentId) -> Result<(), InboxError> {
        let msg_ids: Vec<MessageId> = store
            .thread(id)
            .ok_or(InboxError::ThreadNotFound(id))?
            .messages()
            .iter()
            .filter(|m| !m.is_admin())
            .filter_map(|m| m.id)
            .collect();

        info!("Deleting thread {} ({} messages)", id, msg_ids.len());

        let mut deleted = Vec::new();
        let mut failed = 0;
        for msg_id in &msg_ids {
            match self.api.delete_message(&self.token, *msg_id) {
                Ok(true) => deleted.push(*msg_id),
                Ok(false) => {
                    warn!("Server did not confirm deletion of message {}", msg_id);
                    failed += 1;
                }
                Err(e) => {
                    warn!("Failed to delete message {}: {:#}", msg_id, e);
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            store.remove_thread(id);
            info!("Deleted thread {}", id);
            return Ok(());
        }

        if let Some(thread) = store.thread_mut(id) {
            thread.retain(|m| m.id.is_none_or(|mid| !deleted.contains(&mid)));
            thread.reanchor();
        }

        Err(InboxError::action(
            ActionKind::DeleteThread,
            format!("{} of {} message(s) could not be deleted", failed, msg_ids.len()),
        ))
    }
}
