//! Read-side join of the feed and live statuses

use std::collections::HashMap;

use cui_api::ConversationSummary;

use crate::live_status::{LiveStatus, LiveStatusTracker};
use crate::store::FeedSnapshot;

/// A summary paired with its live status, if one has been seen
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationWithLiveStatus {
    pub summary: ConversationSummary,
    pub live_status: Option<LiveStatus>,
}

impl ConversationWithLiveStatus {
    /// Live status text when connected, otherwise nothing
    pub fn status_line(&self) -> Option<&str> {
        self.live_status
            .as_ref()
            .map(|s| s.current_status.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Join feed entries with the tracker's table by session id, in feed order
pub fn join(snapshot: &FeedSnapshot, tracker: &LiveStatusTracker) -> Vec<ConversationWithLiveStatus> {
    join_with(&snapshot.conversations, &tracker.snapshot())
}

pub fn join_with(
    conversations: &[ConversationSummary],
    statuses: &HashMap<String, LiveStatus>,
) -> Vec<ConversationWithLiveStatus> {
    conversations
        .iter()
        .map(|summary| ConversationWithLiveStatus {
            live_status: statuses.get(&summary.session_id).cloned(),
            summary: summary.clone(),
        })
        .collect()
}

/// Project path of the most recent conversation
pub fn recent_working_directory(snapshot: &FeedSnapshot) -> Option<&str> {
    snapshot
        .conversations
        .first()
        .map(|c| c.project_path.as_str())
        .filter(|p| !p.is_empty())
}

/// Distinct project paths, most recent first
pub fn recent_directories(snapshot: &FeedSnapshot, limit: usize) -> Vec<&str> {
    let mut dirs: Vec<&str> = Vec::new();
    if limit == 0 {
        return dirs;
    }
    for conversation in &snapshot.conversations {
        let path = conversation.project_path.as_str();
        if path.is_empty() || dirs.contains(&path) {
            continue;
        }
        dirs.push(path);
        if dirs.len() == limit {
            break;
        }
    }
    dirs
}
