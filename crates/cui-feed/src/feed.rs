//! The engine wired together

use std::sync::Arc;

use cui_api::ConversationBackend;
use tokio::sync::broadcast;

use crate::coordinator::{RefreshCoordinator, RefreshQueue};
use crate::events::FeedEvent;
use crate::live::LiveStreams;
use crate::live_status::LiveStatusTracker;
use crate::store::{FeedSnapshot, FeedStore};
use crate::view::{self, ConversationWithLiveStatus};

/// Feed store, live statuses, refresh coordinator and stream subscriptions
/// sharing one event channel.
pub struct Feed {
    pub store: FeedStore,
    pub tracker: LiveStatusTracker,
    pub coordinator: RefreshCoordinator,
    pub streams: LiveStreams,
}

impl Feed {
    /// Build the engine. The returned queue must be run for triggers to take effect.
    pub fn new(backend: Arc<dyn ConversationBackend>) -> (Self, RefreshQueue) {
        let (event_tx, _) = broadcast::channel(256);
        let store = FeedStore::with_events(Arc::clone(&backend), event_tx.clone());
        let tracker = LiveStatusTracker::with_events(event_tx);
        let (coordinator, queue) = RefreshCoordinator::new(store.clone());
        let streams = LiveStreams::new(backend, tracker.clone());
        (
            Self {
                store,
                tracker,
                coordinator,
                streams,
            },
            queue,
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.store.snapshot()
    }

    /// Current feed joined with live statuses
    pub fn conversations(&self) -> Vec<ConversationWithLiveStatus> {
        view::join(&self.store.snapshot(), &self.tracker)
    }

    /// Subscribe to running conversations that appeared in the feed
    pub fn sync_streams(&self) -> usize {
        self.streams.sync(&self.store.snapshot().conversations)
    }
}
