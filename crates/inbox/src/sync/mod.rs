//! Load engine for fetching and assembling the inbox
//!
//! A load replaces the whole thread map, so it can be repeated safely.

mod inbox;

pub use inbox::{LoadOptions, LoadStats, load_inbox};
