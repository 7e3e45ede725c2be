//! Plain-text rendering of threads

use chrono::{DateTime, Local, Utc};
use inbox::{AuthorRole, Message, ThreadDetail, ThreadSummary};

const PREVIEW_CHARS: usize = 60;

/// Short timestamp relative to `now`: time today, weekday this week, date otherwise
pub fn format_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let local = at.with_timezone(&Local);
    let now = now.with_timezone(&Local);

    if local.date_naive() == now.date_naive() {
        local.format("%H:%M").to_string()
    } else if (now - local).num_days() < 7 {
        local.format("%a").to_string()
    } else {
        local.format("%b %d").to_string()
    }
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max {
        line.to_string()
    } else {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

pub fn summary_line(summary: &ThreadSummary, now: DateTime<Utc>) -> String {
    let marker = if summary.unread_count > 0 { "●" } else { " " };
    let replied = if summary.has_admin_reply { "↩" } else { " " };
    let unread = if summary.unread_count > 0 {
        format!(" ({})", summary.unread_count)
    } else {
        String::new()
    };

    format!(
        "{}{} {:>6}  {:>7}  {}{}  {}",
        marker,
        replied,
        summary.id,
        format_date(summary.last_activity_at, now),
        summary.name,
        unread,
        truncate(&summary.preview, PREVIEW_CHARS)
    )
}

fn message_line(message: &Message, now: DateTime<Utc>) -> String {
    let author = match message.role {
        AuthorRole::Administrator => "admin",
        AuthorRole::Correspondent => "user",
    };
    let mut flags = String::new();
    if message.is_pending() {
        flags.push_str(" [sending]");
    }
    if message.is_unread() {
        flags.push_str(" [unread]");
    }
    if message.timestamp_estimated {
        flags.push_str(" [time estimated]");
    }

    format!(
        "  {:>7} {:<5}{}\n    {}",
        format_date(message.sent_at, now),
        author,
        flags,
        message.content.replace('\n', "\n    ")
    )
}

pub fn detail(detail: &ThreadDetail, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{} <{}> · {} message(s), {} unread\n",
        detail.summary.name,
        detail.summary.email,
        detail.summary.message_count,
        detail.summary.unread_count
    );
    for message in &detail.messages {
        out.push('\n');
        out.push_str(&message_line(message, now));
    }
    out
}
