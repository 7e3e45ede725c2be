//! InboxService facade for UniFFI export
//!
//! A high-level, FFI-friendly API wrapping the load engine, thread queries
//! and administrator actions around one in-memory store.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::actions::ActionHandler;
use crate::api::AuthToken;
use crate::ffi::transport::{ForeignInboxApi, InboxTransport};
use crate::ffi::types::*;
use crate::models::CorrespondentId;
use crate::query::{ThreadFilter, get_thread_detail, list_store_threads};
use crate::store::InboxStore;
use crate::sync::LoadOptions;
use crate::threads::ReconcilePolicy;

/// Main service object for inbox operations
///
/// Calls are serialized on the store lock, including the transport calls
/// they make, so the host should invoke them off the UI thread.
#[derive(uniffi::Object)]
pub struct InboxService {
    handler: ActionHandler,
    store: Mutex<InboxStore>,
    options: LoadOptions,
}

impl InboxService {
    fn store(&self) -> Result<MutexGuard<'_, InboxStore>, InboxFfiError> {
        self.store.lock().map_err(|_| InboxFfiError::Internal {
            message: "Inbox store lock poisoned".to_string(),
        })
    }
}

#[uniffi::export]
impl InboxService {
    /// Create a service driving `transport` with the administrator `token`
    #[uniffi::constructor]
    pub fn new(transport: Arc<dyn InboxTransport>, token: String) -> Arc<Self> {
        let api = Arc::new(ForeignInboxApi::new(transport));
        Arc::new(Self {
            handler: ActionHandler::new(api, AuthToken::new(token)),
            store: Mutex::new(InboxStore::new()),
            options: LoadOptions::default(),
        })
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch the inbox, rebuild every thread and reconcile replies
    pub fn load(&self) -> Result<FfiLoadStats, InboxFfiError> {
        let mut store = self.store()?;
        let stats = self.handler.refresh(&mut store, &self.options)?;
        Ok(stats.into())
    }

    /// Same as `load`; the store is always rebuilt from scratch
    pub fn refresh(&self) -> Result<FfiLoadStats, InboxFfiError> {
        self.load()
    }

    /// Fetch and merge the replies of one thread, returning how many were added
    pub fn reconcile_thread(&self, correspondent_id: i64) -> Result<u32, InboxFfiError> {
        let mut store = self.store()?;
        let added = self.handler.reconcile(
            &mut store,
            CorrespondentId(correspondent_id),
            ReconcilePolicy::ReplaceAdministrator,
        )?;
        Ok(added as u32)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// List threads newest first
    ///
    /// `filter` is one of "all", "unread" or "replied"; anything else lists all.
    pub fn list_threads(&self, filter: String) -> Result<Vec<FfiThreadSummary>, InboxFfiError> {
        let store = self.store()?;
        Ok(list_store_threads(&store, ThreadFilter::parse(&filter))
            .into_iter()
            .map(FfiThreadSummary::from)
            .collect())
    }

    /// Get a thread with all of its messages
    pub fn get_thread(&self, correspondent_id: i64) -> Result<Option<FfiThreadDetail>, InboxFfiError> {
        let store = self.store()?;
        Ok(get_thread_detail(&store, CorrespondentId(correspondent_id)).map(FfiThreadDetail::from))
    }

    /// Unread messages across all threads
    pub fn global_unread(&self) -> Result<u32, InboxFfiError> {
        Ok(self.store()?.global_unread() as u32)
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Mark every unread message of a thread as read
    ///
    /// Messages the server does not confirm stay unread and are listed in
    /// `failed_ids`.
    pub fn mark_thread_read(&self, correspondent_id: i64) -> Result<FfiMarkReadResult, InboxFfiError> {
        let mut store = self.store()?;
        let outcome = self
            .handler
            .mark_thread_read(&mut store, CorrespondentId(correspondent_id))?;
        Ok(outcome.into())
    }

    /// Send a reply to a thread
    pub fn send_reply(&self, correspondent_id: i64, text: String) -> Result<FfiReplyStatus, InboxFfiError> {
        let mut store = self.store()?;
        let attempt = self
            .handler
            .send_reply(&mut store, CorrespondentId(correspondent_id), &text)?;
        Ok(attempt.into())
    }

    /// Delete a thread and its correspondent messages
    pub fn delete_thread(&self, correspondent_id: i64) -> Result<(), InboxFfiError> {
        let mut store = self.store()?;
        self.handler
            .delete_thread(&mut store, CorrespondentId(correspondent_id))?;
        Ok(())
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Normalize a filter name to "all", "unread" or "replied"
#[uniffi::export]
pub fn normalize_thread_filter(filter: String) -> String {
    ThreadFilter::parse(&filter).as_str().to_string()
}
