//! Thread construction and reply reconciliation

mod builder;
mod reconcile;

pub use builder::{BuildOutcome, BuildStats, build_threads};
pub use reconcile::{
    MergeOutcome, ReconcilePolicy, ReplyBatch, fetch_reply_batch, merge_replies, reconcile_thread,
};
