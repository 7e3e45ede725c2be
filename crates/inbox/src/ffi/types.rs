//! FFI-friendly type wrappers for UniFFI export
//!
//! These types convert internal Rust types to FFI-compatible versions:
//! - `DateTime<Utc>` → `i64` (Unix timestamp in milliseconds)
//! - `CorrespondentId`/`MessageId` → `i64`
//! - `InboxError` → `InboxFfiError`

use chrono::{DateTime, TimeZone, Utc};

use crate::actions::{MarkReadOutcome, ReplyAttempt, ActionStatus};
use crate::api::types::{InboxMessage, ReplyMessage, SenderInfo};
use crate::error::InboxError;
use crate::models::{AuthorRole, CorrespondentId, Message, MessageId};
use crate::query::{ThreadDetail, ThreadSummary};
use crate::sync::LoadStats;

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

// ============================================================================
// Error Types
// ============================================================================

/// FFI-friendly error type
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum InboxFfiError {
    #[error("Authentication required: {message}")]
    Auth { message: String },

    #[error("Fetch error: {message}")]
    Fetch { message: String },

    #[error("Action failed: {message}")]
    Action { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl InboxFfiError {
    /// Whether the host should show a transient notification instead of
    /// a full-screen error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InboxFfiError::Action { .. } | InboxFfiError::NotFound { .. })
    }
}

impl From<InboxError> for InboxFfiError {
    fn from(e: InboxError) -> Self {
        let message = e.to_string();
        match e {
            InboxError::Auth { .. } => InboxFfiError::Auth { message },
            InboxError::Fetch { .. } => InboxFfiError::Fetch { message },
            InboxError::Action { .. } => InboxFfiError::Action { message },
            InboxError::ThreadNotFound(id) => InboxFfiError::NotFound {
                resource: format!("thread {}", id),
            },
        }
    }
}

/// Error returned by a foreign transport implementation
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum TransportError {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Request failed: {message}")]
    Failed { message: String },

    #[error("Unexpected callback error: {message}")]
    Unexpected { message: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for TransportError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        TransportError::Unexpected { message: e.reason }
    }
}

// ============================================================================
// Collaborator Records
// ============================================================================

/// FFI-friendly author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiAuthorRole {
    Correspondent,
    Administrator,
}

impl From<AuthorRole> for FfiAuthorRole {
    fn from(role: AuthorRole) -> Self {
        match role {
            AuthorRole::Correspondent => FfiAuthorRole::Correspondent,
            AuthorRole::Administrator => FfiAuthorRole::Administrator,
        }
    }
}

impl From<FfiAuthorRole> for AuthorRole {
    fn from(role: FfiAuthorRole) -> Self {
        match role {
            FfiAuthorRole::Correspondent => AuthorRole::Correspondent,
            FfiAuthorRole::Administrator => AuthorRole::Administrator,
        }
    }
}

/// Inbox listing record supplied by the host transport
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInboxMessage {
    pub id: Option<i64>,
    pub correspondent_id: Option<i64>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub content: String,
    /// Unix timestamp (milliseconds since epoch)
    pub created_at_ms: Option<i64>,
    pub is_read: bool,
}

impl From<FfiInboxMessage> for InboxMessage {
    fn from(m: FfiInboxMessage) -> Self {
        let sender = if m.sender_name.is_some() || m.sender_email.is_some() {
            Some(SenderInfo {
                name: m.sender_name,
                email: m.sender_email,
            })
        } else {
            None
        };

        Self {
            id: m.id.map(MessageId),
            correspondent_id: m.correspondent_id.map(CorrespondentId),
            sender,
            content: m.content,
            created_at: from_millis(m.created_at_ms),
            is_read: m.is_read,
        }
    }
}

/// Reply listing record supplied by the host transport
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReplyMessage {
    pub id: Option<i64>,
    pub content: String,
    pub role: FfiAuthorRole,
    /// Unix timestamp (milliseconds since epoch)
    pub created_at_ms: Option<i64>,
    pub is_read: bool,
}

impl From<FfiReplyMessage> for ReplyMessage {
    fn from(r: FfiReplyMessage) -> Self {
        Self {
            id: r.id.map(MessageId),
            content: r.content,
            role: r.role.into(),
            created_at: from_millis(r.created_at_ms),
            is_read: r.is_read,
        }
    }
}

// ============================================================================
// Thread Types
// ============================================================================

/// FFI-friendly message representation
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMessage {
    pub id: Option<i64>,
    /// Set while the message is an unconfirmed optimistic reply
    pub pending_id: Option<u64>,
    pub content: String,
    pub role: FfiAuthorRole,
    /// Unix timestamp (milliseconds since epoch)
    pub sent_at_ms: i64,
    pub timestamp_estimated: bool,
    pub is_read: bool,
}

impl From<Message> for FfiMessage {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.map(|id| id.0),
            pending_id: m.pending_id.map(|p| p.0),
            content: m.content,
            role: m.role.into(),
            sent_at_ms: to_millis(m.sent_at),
            timestamp_estimated: m.timestamp_estimated,
            is_read: m.is_read,
        }
    }
}

/// FFI-friendly thread summary for list views
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiThreadSummary {
    pub correspondent_id: i64,
    pub name: String,
    pub email: String,
    /// Unix timestamp (milliseconds since epoch)
    pub last_activity_at_ms: i64,
    pub message_count: u32,
    pub unread_count: u32,
    pub has_admin_reply: bool,
    pub preview: String,
}

impl From<ThreadSummary> for FfiThreadSummary {
    fn from(t: ThreadSummary) -> Self {
        Self {
            correspondent_id: t.id.0,
            name: t.name,
            email: t.email,
            last_activity_at_ms: to_millis(t.last_activity_at),
            message_count: t.message_count as u32,
            unread_count: t.unread_count as u32,
            has_admin_reply: t.has_admin_reply,
            preview: t.preview,
        }
    }
}

/// FFI-friendly thread detail with messages
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiThreadDetail {
    pub summary: FfiThreadSummary,
    pub messages: Vec<FfiMessage>,
}

impl From<ThreadDetail> for FfiThreadDetail {
    fn from(d: ThreadDetail) -> Self {
        Self {
            summary: d.summary.into(),
            messages: d.messages.into_iter().map(FfiMessage::from).collect(),
        }
    }
}

// ============================================================================
// Action Results
// ============================================================================

/// FFI-friendly load statistics
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLoadStats {
    pub threads: u32,
    pub messages_fetched: u32,
    pub messages_discarded: u32,
    pub estimated_timestamps: u32,
    pub replies_merged: u32,
    pub reply_errors: u32,
    pub unread: u32,
    pub duration_ms: u64,
}

impl From<LoadStats> for FfiLoadStats {
    fn from(s: LoadStats) -> Self {
        Self {
            threads: s.threads as u32,
            messages_fetched: s.messages_fetched as u32,
            messages_discarded: s.messages_discarded as u32,
            estimated_timestamps: s.estimated_timestamps as u32,
            replies_merged: s.replies_merged as u32,
            reply_errors: s.reply_errors as u32,
            unread: s.unread as u32,
            duration_ms: s.duration_ms,
        }
    }
}

/// FFI-friendly mark-read result
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMarkReadResult {
    pub marked: u32,
    /// IDs of messages that stay unread because the server did not confirm
    pub failed_ids: Vec<i64>,
    /// Unread messages without a server ID
    pub unmarkable: u32,
}

impl From<MarkReadOutcome> for FfiMarkReadResult {
    fn from(o: MarkReadOutcome) -> Self {
        Self {
            marked: o.marked as u32,
            failed_ids: o.failed.into_iter().map(|id| id.0).collect(),
            unmarkable: o.unmarkable as u32,
        }
    }
}

/// Outcome of sending a reply
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiReplyStatus {
    /// Blank text, nothing was sent
    Skipped,
    Confirmed { marked_read: u32 },
    RolledBack { message: String },
}

impl From<Option<ReplyAttempt>> for FfiReplyStatus {
    fn from(attempt: Option<ReplyAttempt>) -> Self {
        let Some(attempt) = attempt else {
            return FfiReplyStatus::Skipped;
        };
        match attempt.status {
            ActionStatus::Confirmed => FfiReplyStatus::Confirmed {
                marked_read: attempt.marked_read as u32,
            },
            ActionStatus::RolledBack | ActionStatus::Pending => FfiReplyStatus::RolledBack {
                message: attempt
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "Reply was not confirmed".to_string()),
            },
        }
    }
}

// ============================================================================
// Log Callback
// ============================================================================

/// Log level for FFI callback
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for FfiLogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => FfiLogLevel::Error,
            log::Level::Warn => FfiLogLevel::Warn,
            log::Level::Info => FfiLogLevel::Info,
            log::Level::Debug => FfiLogLevel::Debug,
            log::Level::Trace => FfiLogLevel::Trace,
        }
    }
}

impl From<FfiLogLevel> for log::Level {
    fn from(level: FfiLogLevel) -> Self {
        match level {
            FfiLogLevel::Error => log::Level::Error,
            FfiLogLevel::Warn => log::Level::Warn,
            FfiLogLevel::Info => log::Level::Info,
            FfiLogLevel::Debug => log::Level::Debug,
            FfiLogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Callback interface for receiving log messages from Rust
///
/// Swift should implement this using os_log/Logger for unified logging.
#[uniffi::export(callback_interface)]
pub trait LogCallback: Send + Sync {
    /// Called when a log message is emitted
    ///
    /// # Arguments
    /// * `level` - The log level (error, warn, info, debug, trace)
    /// * `target` - The logging target (typically module path, e.g., "inbox::sync")
    /// * `message` - The log message
    fn on_log(&self, level: FfiLogLevel, target: String, message: String);
}
