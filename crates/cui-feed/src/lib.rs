//! cui-feed: conversation feed and live-status synchronization
//!
//! This crate keeps a paginated, filtered collection of conversation
//! summaries in sync with the backend, overlays live status from each
//! running conversation's event stream, and decides when to refresh.

pub mod coordinator;
pub mod cursor;
pub mod error;
pub mod events;
pub mod feed;
pub mod filter;
pub mod live;
pub mod live_status;
pub mod metrics;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{
    Phase, RefreshCoordinator, RefreshQueue, RefreshReason, RefreshRequested, Trigger,
    TriggerGuard, Visibility,
};
pub use cursor::PaginationCursor;
pub use error::FeedError;
pub use events::FeedEvent;
pub use feed::Feed;
pub use filter::{Tab, resolve};
pub use live::LiveStreams;
pub use live_status::{ConnectionState, LiveStatus, LiveStatusTracker};
pub use metrics::{ToolDelta, ToolKind, ToolMetrics};
pub use store::{FeedSnapshot, FeedState, FeedStore, LoadMoreOutcome, RefreshOutcome};
pub use view::{ConversationWithLiveStatus, recent_directories, recent_working_directory};
