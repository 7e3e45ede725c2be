//! Host-implemented transport
//!
//! The host app owns networking. It implements [`InboxTransport`] in
//! Swift/Kotlin and the core drives it through the [`InboxApi`] seam.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::types::{FfiInboxMessage, FfiReplyMessage, TransportError};
use crate::api::types::{InboxMessage, ReplyMessage};
use crate::api::{AuthRequiredError, AuthToken, InboxApi};
use crate::models::MessageId;

/// Collaborator API operations implemented by the host
#[uniffi::export(with_foreign)]
pub trait InboxTransport: Send + Sync {
    fn fetch_inbox_messages(&self, token: String) -> Result<Vec<FfiInboxMessage>, TransportError>;

    fn fetch_replies(&self, token: String, anchor_id: i64) -> Result<Vec<FfiReplyMessage>, TransportError>;

    /// Returns whether the server accepted the reply
    fn send_reply(&self, token: String, anchor_id: i64, text: String) -> Result<bool, TransportError>;

    fn mark_message_read(&self, token: String, message_id: i64) -> Result<bool, TransportError>;

    fn delete_message(&self, token: String, message_id: i64) -> Result<bool, TransportError>;
}

/// Adapts a host transport to [`InboxApi`]
pub(crate) struct ForeignInboxApi {
    transport: Arc<dyn InboxTransport>,
}

impl ForeignInboxApi {
    pub(crate) fn new(transport: Arc<dyn InboxTransport>) -> Self {
        Self { transport }
    }
}

/// Convert a transport error, keeping auth rejections recognizable
fn convert(e: TransportError) -> anyhow::Error {
    match e {
        TransportError::Unauthorized { message } => {
            anyhow::Error::new(AuthRequiredError).context(message)
        }
        other => anyhow::Error::new(other),
    }
}

impl InboxApi for ForeignInboxApi {
    fn fetch_inbox_messages(&self, token: &AuthToken) -> Result<Vec<InboxMessage>> {
        let records = self
            .transport
            .fetch_inbox_messages(token.as_str().to_string())
            .map_err(convert)
            .context("Inbox listing failed")?;
        Ok(records.into_iter().map(InboxMessage::from).collect())
    }

    fn fetch_replies(&self, token: &AuthToken, anchor_id: MessageId) -> Result<Vec<ReplyMessage>> {
        let records = self
            .transport
            .fetch_replies(token.as_str().to_string(), anchor_id.0)
            .map_err(convert)
            .with_context(|| format!("Reply listing failed for message {}", anchor_id))?;
        Ok(records.into_iter().map(ReplyMessage::from).collect())
    }

    fn send_reply(&self, token: &AuthToken, anchor_id: MessageId, text: &str) -> Result<bool> {
        self.transport
            .send_reply(token.as_str().to_string(), anchor_id.0, text.to_string())
            .map_err(convert)
    }

    fn mark_message_read(&self, token: &AuthToken, message_id: MessageId) -> Result<bool> {
        self.transport
            .mark_message_read(token.as_str().to_string(), message_id.0)
            .map_err(convert)
    }

    fn delete_message(&self, token: &AuthToken, message_id: MessageId) -> Result<bool> {
        self.transport
            .delete_message(token.as_str().to_string(), message_id.0)
            .map_err(convert)
    }
}
