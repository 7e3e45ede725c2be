//! Inbox crate - Business logic for the administrator messaging inbox
//!
//! This crate provides platform-independent inbox functionality including:
//! - Domain models (Correspondent, Message, Thread)
//! - The collaborator API seam and an in-memory implementation
//! - Thread building and reply reconciliation
//! - A load engine that rebuilds the store from the server
//! - Query API for list and detail views
//! - Action handlers for replying, marking read and deleting
//!
//! This crate has no UI dependencies and exports its API over UniFFI for
//! the mobile apps.

pub mod actions;
pub mod api;
pub mod config;
pub mod error;
pub mod ffi;
pub mod models;
pub mod query;
pub mod store;
pub mod sync;
pub mod threads;

pub use actions::{ActionHandler, ActionStatus, MarkReadOutcome, PendingReply, ReplyAttempt};
pub use api::{AuthRequiredError, AuthToken, InMemoryInboxApi, InboxApi, InboxSnapshot};
pub use config::{AdminCredentials, ConsoleSettings};
pub use error::{ActionKind, InboxError};
pub use models::{AuthorRole, Correspondent, CorrespondentId, Message, MessageId, PendingId, Thread};
pub use query::{ThreadDetail, ThreadFilter, ThreadSummary, get_thread_detail, list_store_threads, list_threads};
pub use store::{ApplyOutcome, InboxStore};
pub use sync::{LoadOptions, LoadStats, load_inbox};
pub use threads::{MergeOutcome, ReconcilePolicy, build_threads, merge_replies, reconcile_thread};

uniffi::setup_scaffolding!();
