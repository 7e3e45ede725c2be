//! Inbox actions module
//!
//! Provides the action handler for replies, read state and deletion.

mod handler;

pub use handler::{ActionHandler, ActionStatus, MarkReadOutcome, PendingReply, ReplyAttempt};
