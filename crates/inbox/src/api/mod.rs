//! Collaborator API consumed by the inbox core
//!
//! This module provides:
//! - The `InboxApi` trait implemented by the host's transport
//! - Payload records returned by the collaborator
//! - Normalization of payloads to domain models
//! - An in-memory collaborator for tests and offline replay

mod memory;
mod normalize;
mod traits;

pub use memory::{ApiCall, ApiOperation, FailureMode, InMemoryInboxApi, InboxSnapshot, ReplySet};
pub use normalize::{normalize_inbox_message, normalize_reply};
pub use traits::{AuthRequiredError, AuthToken, InboxApi};

/// Records exchanged with the collaborator API
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use crate::models::{AuthorRole, CorrespondentId, MessageId};

    /// Sender metadata attached to an inbox message
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct SenderInfo {
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub email: Option<String>,
    }

    /// Message as returned by the inbox listing
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InboxMessage {
        #[serde(default)]
        pub id: Option<MessageId>,
        #[serde(default)]
        pub correspondent_id: Option<CorrespondentId>,
        #[serde(default)]
        pub sender: Option<SenderInfo>,
        #[serde(default)]
        pub content: String,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub is_read: bool,
    }

    /// Message as returned by the reply listing of an anchor message
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReplyMessage {
        #[serde(default)]
        pub id: Option<MessageId>,
        #[serde(default)]
        pub content: String,
        pub role: AuthorRole,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub is_read: bool,
    }
}
