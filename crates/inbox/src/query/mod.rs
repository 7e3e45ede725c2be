//! Query API for UI consumption
//!
//! Provides the filtered, sorted projections of the thread map that list
//! and detail screens render.

mod threads;

pub use threads::{
    ThreadDetail, ThreadFilter, ThreadSummary, get_thread_detail, list_store_threads, list_threads,
};
