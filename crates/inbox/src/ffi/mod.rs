//! FFI bindings for UniFFI export
//!
//! Swift/Kotlin bindings for the inbox crate. The host app implements
//! `InboxTransport` over its HTTP stack and hands it to `InboxService`.
//!
//! ## Usage from Kotlin
//!
//! ```kotlin
//! // Route Rust logs to Logcat first
//! initializeLogging(callback = logcatCallback, maxLevel = FfiLogLevel.INFO)
//!
//! val service = InboxService(transport = RetrofitTransport(api), token = adminToken)
//!
//! // Fetch, group and reconcile
//! val stats = service.load()
//!
//! // Render the list
//! val threads = service.listThreads(filter = "unread")
//! val badge = service.globalUnread()
//!
//! // Act on a thread
//! service.markThreadRead(correspondentId = threads[0].correspondentId)
//! when (val status = service.sendReply(correspondentId = 42, text = "On it")) {
//!     is FfiReplyStatus.RolledBack -> showToast(status.message)
//!     else -> {}
//! }
//! ```

mod logging;
mod service;
mod transport;
mod types;

pub use logging::{init_ffi_logger, initialize_logging, set_log_callback, set_log_level, set_logging_level};
pub use service::*;
pub use transport::InboxTransport;
pub use types::*;
