//! Error taxonomy surfaced to the presentation layer

use std::fmt;

use crate::api::AuthRequiredError;
use crate::models::CorrespondentId;

/// User-triggered actions that can fail and be rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    SendReply,
    MarkRead,
    DeleteThread,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::SendReply => "Send reply",
            ActionKind::MarkRead => "Mark as read",
            ActionKind::DeleteThread => "Delete thread",
        };
        f.write_str(name)
    }
}

/// Errors reported by inbox operations
///
/// `Auth` and `Fetch` on the initial load are screen-level failures;
/// `Action` errors are transient notifications after a local rollback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InboxError {
    #[error("Authentication required: {message}")]
    Auth { message: String },

    #[error("Failed to fetch {what}: {message}")]
    Fetch { what: &'static str, message: String },

    #[error("{action} failed: {message}")]
    Action { action: ActionKind, message: String },

    #[error("No thread for correspondent {0}")]
    ThreadNotFound(CorrespondentId),
}

impl InboxError {
    /// Classify a collaborator failure raised while fetching data.
    pub fn from_fetch(what: &'static str, err: &anyhow::Error) -> Self {
        if err.downcast_ref::<AuthRequiredError>().is_some() {
            InboxError::Auth {
                message: err.to_string(),
            }
        } else {
            InboxError::Fetch {
                what,
                message: format!("{:#}", err),
            }
        }
    }

    pub fn action(action: ActionKind, message: impl Into<String>) -> Self {
        InboxError::Action {
            action,
            message: message.into(),
        }
    }

    /// True for errors shown as a transient notification rather than a
    /// full-screen error state.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InboxError::Action { .. } | InboxError::ThreadNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_auth_errors_are_classified() {
        let err: anyhow::Error = AuthRequiredError.into();
        let err = err.context("fetching inbox");
        let classified = InboxError::from_fetch("inbox", &err);
        assert!(matches!(classified, InboxError::Auth { .. }));
        assert!(!classified.is_recoverable());
    }

    #[test]
    fn test_other_errors_are_fetch_errors() {
        let err = anyhow!("connection reset");
        let classified = InboxError::from_fetch("replies", &err);
        assert_eq!(
            classified.to_string(),
            "Failed to fetch replies: connection reset"
        );
    }

    #[test]
    fn test_action_errors_are_recoverable() {
        let err = InboxError::action(ActionKind::SendReply, "server returned false");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Send reply failed: server returned false");
    }
}
