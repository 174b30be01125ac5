//! The conversation feed store
//!
//! [`FeedState`] holds the collection and its flags and only changes through
//! begin/complete pairs, so every transition can be tested without a runtime.
//! [`FeedStore`] wraps it with a backend and runs the fetches.
//!
//! Two guards keep late responses from corrupting the collection:
//!
//! - every refresh takes the next sequence number, and only the response whose
//!   number is still the latest issued may apply;
//! - a "load more" remembers the generation it was issued in, and is dropped
//!   if any refresh was issued before it completed.

use std::collections::HashSet;
use std::sync::Arc;

use cui_api::{ConversationBackend, ConversationPage, ConversationQuery, ConversationSummary, Cursor, FilterSpec};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::cursor::PaginationCursor;
use crate::error::FeedError;
use crate::events::FeedEvent;

/// Issued by [`FeedState::begin_refresh`]; hand it back on completion
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTicket {
    pub seq: u64,
    pub query: ConversationQuery,
}

/// Issued by [`FeedState::begin_load_more`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadMoreTicket {
    pub generation: u64,
    pub query: ConversationQuery,
}

/// How a refresh ended
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied { seq: u64, count: usize },
    Failed { seq: u64, error: FeedError },
    /// A newer refresh was issued before this one completed
    Discarded { seq: u64, latest: u64 },
}

/// How a "load more" ended
#[derive(Debug, Clone, PartialEq)]
pub enum LoadMoreOutcome {
    Appended { added: usize, has_more: bool },
    Failed { error: FeedError },
    /// The collection was replaced while the page was in flight
    Discarded,
    /// Nothing to load, or a load is already pending
    Skipped,
}

/// Read-only copy of the feed for rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub conversations: Vec<ConversationSummary>,
    pub filter: FilterSpec,
    pub loading: bool,
    pub loading_more: bool,
    pub has_more: bool,
    pub error: Option<FeedError>,
    /// At least one refresh has succeeded
    pub has_loaded: bool,
}

impl FeedSnapshot {
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.conversations.iter().any(|c| c.session_id == session_id)
    }
}

/// Feed state and its transitions
#[derive(Debug, Default)]
pub struct FeedState {
    conversations: Vec<ConversationSummary>,
    filter: FilterSpec,
    cursor: PaginationCursor,
    loading: bool,
    loading_more: bool,
    error: Option<FeedError>,
    has_loaded: bool,
    /// Highest refresh sequence number handed out
    issued_seq: u64,
    /// Bumped each time a refresh is issued; a pending "load more" from an
    /// older generation is dropped
    generation: u64,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh. The returned ticket supersedes any refresh still in flight.
    pub fn begin_refresh(&mut self, filter: FilterSpec, count_hint: Option<usize>) -> RefreshTicket {
        self.issued_seq += 1;
        self.generation += 1;
        self.filter = filter;
        self.loading = true;
        RefreshTicket {
            seq: self.issued_seq,
            query: ConversationQuery::first_page(filter).with_count_hint(count_hint),
        }
    }

    /// Finish a refresh. Only the latest issued refresh may change anything.
    pub fn complete_refresh(
        &mut self,
        seq: u64,
        result: Result<ConversationPage, FeedError>,
    ) -> RefreshOutcome {
        if seq != self.issued_seq {
            return RefreshOutcome::Discarded {
                seq,
                latest: self.issued_seq,
            };
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.cursor = PaginationCursor::from_page(&page);
                self.conversations = dedup(page.items);
                self.error = None;
                self.has_loaded = true;
                RefreshOutcome::Applied {
                    seq,
                    count: self.conversations.len(),
                }
            }
            Err(error) => {
                self.error = Some(error.clone());
                RefreshOutcome::Failed { seq, error }
            }
        }
    }

    /// Start a "load more", or `None` when there is nothing to load or a
    /// refresh or another load is pending.
    pub fn begin_load_more(&mut self) -> Option<LoadMoreTicket> {
        if !self.cursor.has_more() || self.loading_more || self.loading {
            return None;
        }
        self.loading_more = true;
        Some(LoadMoreTicket {
            generation: self.generation,
            query: ConversationQuery::first_page(self.filter)
                .with_cursor(self.cursor.position().cloned()),
        })
    }

    pub fn complete_load_more(
        &mut self,
        generation: u64,
        result: Result<ConversationPage, FeedError>,
    ) -> LoadMoreOutcome {
        self.loading_more = false;
        if generation != self.generation {
            return LoadMoreOutcome::Discarded;
        }
        match result {
            Ok(page) => {
                self.cursor.advance(&page);
                let added = self.append(page.items);
                LoadMoreOutcome::Appended {
                    added,
                    has_more: self.cursor.has_more(),
                }
            }
            Err(error) => {
                self.error = Some(error.clone());
                LoadMoreOutcome::Failed { error }
            }
        }
    }

    /// Forget the pagination position
    pub fn reset_cursor(&mut self) {
        self.cursor.reset();
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            conversations: self.conversations.clone(),
            filter: self.filter,
            loading: self.loading,
            loading_more: self.loading_more,
            has_more: self.cursor.has_more(),
            error: self.error.clone(),
            has_loaded: self.has_loaded,
        }
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn filter(&self) -> FilterSpec {
        self.filter
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.position()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    fn append(&mut self, items: Vec<ConversationSummary>) -> usize {
        let mut seen: HashSet<String> = self
            .conversations
            .iter()
            .map(|c| c.session_id.clone())
            .collect();
        let before = self.conversations.len();
        for item in items {
            if seen.insert(item.session_id.clone()) {
                self.conversations.push(item);
            }
        }
        self.conversations.len() - before
    }
}

/// Keep the first occurrence of each session id, preserving order
fn dedup(items: Vec<ConversationSummary>) -> Vec<ConversationSummary> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.session_id.clone()))
        .collect()
}

/// Shared handle to the feed. Clones operate on the same state.
///
/// The state lock is only held for the synchronous transitions, never
/// across a fetch.
#[derive(Clone)]
pub struct FeedStore {
    state: Arc<Mutex<FeedState>>,
    backend: Arc<dyn ConversationBackend>,
    event_tx: broadcast::Sender<FeedEvent>,
}

impl FeedStore {
    pub fn new(backend: Arc<dyn ConversationBackend>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self::with_events(backend, event_tx)
    }

    /// Build a store that announces changes on an existing channel
    pub fn with_events(
        backend: Arc<dyn ConversationBackend>,
        event_tx: broadcast::Sender<FeedEvent>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState::new())),
            backend,
            event_tx,
        }
    }

    /// Subscribe to feed events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Sender<FeedEvent> {
        self.event_tx.clone()
    }

    pub fn backend(&self) -> Arc<dyn ConversationBackend> {
        Arc::clone(&self.backend)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.lock().snapshot()
    }

    /// Fetch the first page for `filter` and replace the collection.
    ///
    /// Failures are captured into the state; the previous collection stays.
    pub async fn refresh(&self, count_hint: Option<usize>, filter: FilterSpec) -> RefreshOutcome {
        let ticket = self.state.lock().begin_refresh(filter, count_hint);
        tracing::debug!("Refresh #{} started ({:?}, hint {:?})", ticket.seq, filter, count_hint);
        self.emit(FeedEvent::RefreshStarted {
            seq: ticket.seq,
            filter,
        });

        let result = self
            .backend
            .fetch_conversations(&ticket.query)
            .await
            .map_err(FeedError::from);

        let outcome = self.state.lock().complete_refresh(ticket.seq, result);
        match &outcome {
            RefreshOutcome::Applied { seq, count } => {
                self.emit(FeedEvent::RefreshApplied {
                    seq: *seq,
                    count: *count,
                });
            }
            RefreshOutcome::Failed { seq, error } => {
                tracing::warn!("Refresh #{} failed: {}", seq, error);
                self.emit(FeedEvent::RefreshFailed {
                    seq: *seq,
                    error: error.clone(),
                });
            }
            RefreshOutcome::Discarded { seq, latest } => {
                tracing::debug!("Refresh #{} superseded by #{}", seq, latest);
                self.emit(FeedEvent::RefreshDiscarded {
                    seq: *seq,
                    latest: *latest,
                });
            }
        }
        outcome
    }

    /// Append the next page. No-op while another load is pending or when
    /// the feed is exhausted.
    pub async fn load_more(&self) -> LoadMoreOutcome {
        let Some(ticket) = self.state.lock().begin_load_more() else {
            return LoadMoreOutcome::Skipped;
        };

        let result = self
            .backend
            .fetch_conversations(&ticket.query)
            .await
            .map_err(FeedError::from);

        let outcome = self
            .state
            .lock()
            .complete_load_more(ticket.generation, result);
        match &outcome {
            LoadMoreOutcome::Appended { added, has_more } => {
                self.emit(FeedEvent::PageAppended {
                    added: *added,
                    has_more: *has_more,
                });
            }
            LoadMoreOutcome::Failed { error } => {
                tracing::warn!("Load more failed: {}", error);
                self.emit(FeedEvent::LoadMoreFailed {
                    error: error.clone(),
                });
            }
            LoadMoreOutcome::Discarded => {
                tracing::debug!("Dropping page fetched for a replaced collection");
                self.emit(FeedEvent::LoadMoreDiscarded);
            }
            LoadMoreOutcome::Skipped => {}
        }
        outcome
    }

    /// Switch filter: reset the cursor and refresh without a count hint
    pub async fn set_filter(&self, filter: FilterSpec) -> RefreshOutcome {
        self.state.lock().reset_cursor();
        self.refresh(None, filter).await
    }

    fn emit(&self, event: FeedEvent) {
        let _ = self.event_tx.send(event);
    }
}
