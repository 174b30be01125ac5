//! Non-interactive listing of the feed

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use cui_api::{ConversationStatus, ConversationSummary};
use cui_feed::{FeedError, FeedStore, LoadMoreOutcome, RefreshOutcome, Tab, recent_directories};
use cui_tui::widgets::task_list::{relative_time, short_path, truncate};

const TITLE_WIDTH: usize = 60;

/// Load the first page for `tab`, and with `all` keep following the cursor
/// until the backend reports no more pages.
pub async fn collect(
    store: &FeedStore,
    tab: Tab,
    all: bool,
) -> Result<Vec<ConversationSummary>, FeedError> {
    if let RefreshOutcome::Failed { error, .. } = store.set_filter(tab.filter()).await {
        return Err(error);
    }

    if all {
        loop {
            match store.load_more().await {
                LoadMoreOutcome::Appended { has_more: true, .. } => continue,
                LoadMoreOutcome::Failed { error } => return Err(error),
                LoadMoreOutcome::Appended { .. }
                | LoadMoreOutcome::Discarded
                | LoadMoreOutcome::Skipped => break,
            }
        }
    }

    Ok(store.snapshot().conversations)
}

/// Distinct project paths from the task feed, most recent first
pub async fn directories(store: &FeedStore, limit: usize) -> Result<Vec<String>, FeedError> {
    if let RefreshOutcome::Failed { error, .. } = store.set_filter(Tab::Tasks.filter()).await {
        return Err(error);
    }
    let snapshot = store.snapshot();
    Ok(recent_directories(&snapshot, limit)
        .into_iter()
        .map(str::to_string)
        .collect())
}

fn status_label(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Completed => "completed",
        ConversationStatus::Ongoing => "ongoing",
        ConversationStatus::Pending => "pending",
    }
}

/// One tab-separated line per conversation
pub fn format_row(summary: &ConversationSummary, now: DateTime<Utc>) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        summary.session_id,
        truncate(summary.title(), TITLE_WIDTH),
        short_path(&summary.project_path),
        relative_time(summary.updated_at, now),
        status_label(summary.status),
    )
}

pub fn write_rows<W: Write>(
    out: &mut W,
    rows: &[ConversationSummary],
    now: DateTime<Utc>,
) -> io::Result<()> {
    for summary in rows {
        writeln!(out, "{}", format_row(summary, now))?;
    }
    Ok(())
}
