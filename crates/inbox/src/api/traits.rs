//! Collaborator trait definitions

use anyhow::Result;
use std::fmt;

use super::types::{InboxMessage, ReplyMessage};
use crate::models::MessageId;

/// Error a collaborator returns when the token is missing or rejected
#[derive(Debug, thiserror::Error)]
#[error("Auth token missing or rejected")]
pub struct AuthRequiredError;

/// Bearer token of the signed-in administrator
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl From<&str> for AuthToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AuthToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Trait for the inbox backend operations
///
/// Implemented by the host application's transport. Calls are blocking and
/// made one at a time; timeouts and retries belong to the implementation.
/// Auth failures should be reported as [`AuthRequiredError`] so callers can
/// tell them apart from network failures.
pub trait InboxApi: Send + Sync {
    /// List every message submitted to the inbox
    fn fetch_inbox_messages(&self, token: &AuthToken) -> Result<Vec<InboxMessage>>;

    /// List the replies attached to an anchor message
    fn fetch_replies(&self, token: &AuthToken, anchor: MessageId) -> Result<Vec<ReplyMessage>>;

    /// Post an administrator reply to an anchor message
    fn send_reply(&self, token: &AuthToken, anchor: MessageId, text: &str) -> Result<bool>;

    /// Mark one message as read on the server
    fn mark_message_read(&self, token: &AuthToken, id: MessageId) -> Result<bool>;

    /// Delete one message on the server
    fn delete_message(&self, token: &AuthToken, id: MessageId) -> Result<bool>;
}
