//! Feed event types

use cui_api::FilterSpec;

use crate::coordinator::RefreshReason;
use crate::error::FeedError;

/// Events emitted as the feed and live statuses change
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A refresh was issued
    RefreshStarted { seq: u64, filter: FilterSpec },

    /// A refresh response replaced the collection
    RefreshApplied { seq: u64, count: usize },

    /// The latest refresh failed; the previous collection is kept
    RefreshFailed { seq: u64, error: FeedError },

    /// A superseded refresh completed and was dropped
    RefreshDiscarded { seq: u64, latest: u64 },

    /// A page was appended by "load more"
    PageAppended { added: usize, has_more: bool },

    LoadMoreFailed { error: FeedError },

    /// The collection changed underneath a pending "load more"
    LoadMoreDiscarded,

    /// A trigger asked for a refresh
    RefreshRequested { reason: RefreshReason },

    /// A session's live status changed
    LiveStatusChanged { session_id: String },
}

impl FeedEvent {
    /// Whether this event changed what a reader of the feed would see
    pub fn changes_view(&self) -> bool {
        !matches!(
            self,
            FeedEvent::RefreshDiscarded { .. }
                | FeedEvent::LoadMoreDiscarded
                | FeedEvent::RefreshRequested { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_view() {
        assert!(FeedEvent::RefreshApplied { seq: 1, count: 3 }.changes_view());
        assert!(FeedEvent::RefreshStarted {
            seq: 1,
            filter: FilterSpec::ALL
        }
        .changes_view());
        assert!(FeedEvent::LiveStatusChanged {
            session_id: "abc".into()
        }
        .changes_view());

        assert!(!FeedEvent::RefreshDiscarded { seq: 1, latest: 2 }.changes_view());
        assert!(!FeedEvent::LoadMoreDiscarded.changes_view());
        assert!(!FeedEvent::RefreshRequested {
            reason: RefreshReason::WindowFocus
        }
        .changes_view());
    }
}
