//! Inbox state owned by the presentation layer
//!
//! Holds the thread map for one load cycle. Every wholesale rebuild bumps
//! the generation so results fetched against an older map can be rejected.

use log::debug;
use std::collections::HashMap;

use crate::models::{CorrespondentId, PendingId, Thread};
use crate::threads::{MergeOutcome, ReconcilePolicy, ReplyBatch, merge_replies};

/// Result of applying a fetched reply batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The batch was merged into its thread
    Applied(MergeOutcome),
    /// The batch was fetched before the last rebuild and was discarded
    Stale,
    /// The thread was removed since the batch was fetched
    MissingThread,
}

/// Thread map plus the bookkeeping needed to mutate it safely
#[derive(Debug, Default)]
pub struct InboxStore {
    threads: HashMap<CorrespondentId, Thread>,
    generation: u64,
    next_pending: u64,
}

impl InboxStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every thread with a freshly built map
    pub fn replace_all(&mut self, threads: HashMap<CorrespondentId, Thread>) -> u64 {
        self.threads = threads;
        self.generation += 1;
        debug!(
            "Inbox rebuilt: generation {} with {} threads",
            self.generation,
            self.threads.len()
        );
        self.generation
    }

    /// Identifier of the current build
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn thread(&self, id: CorrespondentId) -> Option<&Thread> {
        self.threads.get(&id)
    }

    pub fn thread_mut(&mut self, id: CorrespondentId) -> Option<&mut Thread> {
        self.threads.get_mut(&id)
    }

    pub fn remove_thread(&mut self, id: CorrespondentId) -> Option<Thread> {
        self.threads.remove(&id)
    }

    /// All threads, in no particular order
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    /// Correspondent IDs in ascending order
    pub fn thread_ids(&self) -> Vec<CorrespondentId> {
        let mut ids: Vec<_> = self.threads.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Unread messages across all threads
    pub fn global_unread(&self) -> usize {
        self.threads.values().map(Thread::unread_count).sum()
    }

    /// Allocate an ID for an optimistic message
    pub fn next_pending_id(&mut self) -> PendingId {
        self.next_pending += 1;
        PendingId(self.next_pending)
    }

    /// Merge a fetched reply batch, unless it predates the current build
    pub fn apply_replies(&mut self, batch: ReplyBatch, policy: ReconcilePolicy) -> ApplyOutcome {
        if batch.generation != self.generation {
            debug!(
                "Discarding replies for {} from generation {} (current {})",
                batch.correspondent_id, batch.generation, self.generation
            );
            return ApplyOutcome::Stale;
        }

        match self.threads.get_mut(&batch.correspondent_id) {
            Some(thread) => ApplyOutcome::Applied(merge_replies(thread, batch.replies, policy)),
            None => ApplyOutcome::MissingThread,
        }
    }
}
