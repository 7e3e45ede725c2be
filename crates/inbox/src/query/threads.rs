//! Thread query functions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::models::{CorrespondentId, Message, Thread};
use crate::store::InboxStore;

/// Which threads a list view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ThreadFilter {
    #[default]
    All,
    /// Threads with at least one unread message
    Unread,
    /// Threads the administrator has answered
    Replied,
}

impl ThreadFilter {
    /// Parse a filter name; unknown names fall back to `All`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" => ThreadFilter::Unread,
            "replied" => ThreadFilter::Replied,
            _ => ThreadFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadFilter::All => "all",
            ThreadFilter::Unread => "unread",
            ThreadFilter::Replied => "replied",
        }
    }

    pub fn matches(&self, thread: &Thread) -> bool {
        match self {
            ThreadFilter::All => true,
            ThreadFilter::Unread => thread.unread_count() > 0,
            ThreadFilter::Replied => thread.has_admin_reply(),
        }
    }
}

impl FromStr for ThreadFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ThreadFilter {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl fmt::Display for ThreadFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary information for displaying a thread in a list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    /// Correspondent ID (thread key)
    pub id: CorrespondentId,
    /// Display name of the correspondent
    pub name: String,
    /// Contact address of the correspondent
    pub email: String,
    /// Timestamp of the most recent message
    pub last_activity_at: DateTime<Utc>,
    /// Number of messages in the thread
    pub message_count: usize,
    /// Unread correspondent messages
    pub unread_count: usize,
    /// Whether the administrator has replied
    pub has_admin_reply: bool,
    /// Content of the most recent message
    pub preview: String,
}

impl From<&Thread> for ThreadSummary {
    fn from(thread: &Thread) -> Self {
        Self {
            id: thread.id(),
            name: thread.correspondent.name.clone(),
            email: thread.correspondent.email.clone(),
            last_activity_at: thread.last_activity_at(),
            message_count: thread.message_count(),
            unread_count: thread.unread_count(),
            has_admin_reply: thread.has_admin_reply(),
            preview: thread
                .last_message()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
        }
    }
}

/// Detailed thread information including all messages
#[derive(Debug, Clone, Serialize)]
pub struct ThreadDetail {
    /// The thread summary
    pub summary: ThreadSummary,
    /// All messages in the thread, ordered chronologically
    pub messages: Vec<Message>,
}

/// List threads for presentation
///
/// Returns the threads matching `filter`, sorted by last activity
/// descending (newest first). Ties are ordered by correspondent ID.
pub fn list_threads<'a>(
    threads: impl IntoIterator<Item = &'a Thread>,
    filter: ThreadFilter,
) -> Vec<ThreadSummary> {
    let mut selected: Vec<&Thread> = threads.into_iter().filter(|t| filter.matches(t)).collect();
    selected.sort_by(|a, b| {
        b.last_activity_at()
            .cmp(&a.last_activity_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    selected.into_iter().map(ThreadSummary::from).collect()
}

/// List the threads held by a store
pub fn list_store_threads(store: &InboxStore, filter: ThreadFilter) -> Vec<ThreadSummary> {
    list_threads(store.threads(), filter)
}

/// Get one thread with all of its messages
pub fn get_thread_detail(store: &InboxStore, id: CorrespondentId) -> Option<ThreadDetail> {
    let thread = store.thread(id)?;
    Some(ThreadDetail {
        summary: ThreadSummary::from(thread),
        messages: thread.messages().to_vec(),
    })
}
