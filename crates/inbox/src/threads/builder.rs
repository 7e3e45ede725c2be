//! Groups inbox messages into per-correspondent threads

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;

use crate::api::normalize_inbox_message;
use crate::api::types::InboxMessage;
use crate::models::{Correspondent, CorrespondentId, Message, Thread};

/// Counters gathered while building threads
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// Messages placed into a thread
    pub kept: usize,
    /// Messages dropped because they had no correspondent ID
    pub discarded: usize,
    /// Kept messages whose timestamp was substituted
    pub estimated_timestamps: usize,
    /// Unread correspondent messages among the kept ones
    pub unread: usize,
}

/// Threads keyed by correspondent, plus build statistics
#[derive(Debug, Default)]
pub struct BuildOutcome {
    pub threads: HashMap<CorrespondentId, Thread>,
    pub stats: BuildStats,
}

/// Build one thread per distinct correspondent.
///
/// Messages without a timestamp are placed at `now`, the same instant for
/// the whole build. The correspondent's name and address come from the
/// first message seen for them.
pub fn build_threads(
    messages: impl IntoIterator<Item = InboxMessage>,
    now: DateTime<Utc>,
) -> BuildOutcome {
    let mut stats = BuildStats::default();
    let mut grouped: HashMap<CorrespondentId, (Correspondent, Vec<Message>)> = HashMap::new();

    for record in messages {
        let record_id = record.id;
        let Some((correspondent_id, sender, message)) = normalize_inbox_message(record, now) else {
            debug!("Discarding message {:?} without correspondent", record_id);
            stats.discarded += 1;
            continue;
        };

        stats.kept += 1;
        if message.timestamp_estimated {
            stats.estimated_timestamps += 1;
        }
        if message.is_unread() {
            stats.unread += 1;
        }

        grouped
            .entry(correspondent_id)
            .or_insert_with(|| {
                let sender = sender.unwrap_or_default();
                let correspondent = Correspondent::from_metadata(
                    correspondent_id,
                    sender.name.as_deref(),
                    sender.email.as_deref(),
                );
                (correspondent, Vec::new())
            })
            .1
            .push(message);
    }

    let threads = grouped
        .into_iter()
        .map(|(id, (correspondent, messages))| (id, Thread::new(correspondent, messages)))
        .collect();

    BuildOutcome { threads, stats }
}
