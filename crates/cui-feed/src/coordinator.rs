//! Decides when the feed re-synchronizes
//!
//! Triggers (mount, filter change, window focus, visibility) become
//! [`RefreshRequested`] intents on a single queue. The queue coalesces
//! intents that arrive together and hands the result to the [`FeedStore`].

use std::fmt;

use cui_api::FilterSpec;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::FeedEvent;
use crate::store::{FeedSnapshot, FeedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Something that happened to the view showing the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The view was (re)mounted
    Mount,
    FilterChanged(FilterSpec),
    WindowFocus,
    VisibilityChanged(Visibility),
    /// The user asked for a refresh
    Manual,
}

/// Why a refresh was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshReason {
    Mount,
    FilterChanged,
    WindowFocus,
    BecameVisible,
    Manual,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefreshReason::Mount => "mount",
            RefreshReason::FilterChanged => "filter change",
            RefreshReason::WindowFocus => "window focus",
            RefreshReason::BecameVisible => "became visible",
            RefreshReason::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// An intent to refresh the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequested {
    pub reason: RefreshReason,
    pub filter: FilterSpec,
    pub count_hint: Option<usize>,
}

/// Whether the feed has completed an initial load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
}

impl Phase {
    pub fn of(snapshot: &FeedSnapshot) -> Self {
        if snapshot.has_loaded {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}

/// Map a trigger to a refresh intent given the current feed.
///
/// Before the first successful load only a filter change or a manual
/// request refreshes; the view's initial filter selection is what performs
/// the first load.
pub fn decide(trigger: Trigger, snapshot: &FeedSnapshot) -> Option<RefreshRequested> {
    let request = |reason| RefreshRequested {
        reason,
        filter: snapshot.filter,
        count_hint: (!snapshot.is_empty()).then_some(snapshot.len()),
    };
    let resync = |reason| match Phase::of(snapshot) {
        Phase::Idle => None,
        Phase::Ready => Some(request(reason)),
    };
    match trigger {
        Trigger::FilterChanged(filter) => Some(RefreshRequested {
            reason: RefreshReason::FilterChanged,
            filter,
            count_hint: None,
        }),
        Trigger::Mount => resync(RefreshReason::Mount),
        Trigger::WindowFocus => resync(RefreshReason::WindowFocus),
        Trigger::VisibilityChanged(Visibility::Visible) => resync(RefreshReason::BecameVisible),
        Trigger::VisibilityChanged(Visibility::Hidden) => None,
        Trigger::Manual => Some(request(RefreshReason::Manual)),
    }
}

/// Collapse intents that arrived together into one.
///
/// The last filter change wins and drops the count hint. Without a filter
/// change the largest hint is kept.
pub fn coalesce(batch: &[RefreshRequested]) -> Option<RefreshRequested> {
    if let Some(change) = batch
        .iter()
        .rev()
        .find(|r| r.reason == RefreshReason::FilterChanged)
    {
        return Some(*change);
    }
    let last = batch.last()?;
    Some(RefreshRequested {
        count_hint: batch.iter().filter_map(|r| r.count_hint).max(),
        ..*last
    })
}

/// Turns triggers into refresh intents
#[derive(Clone)]
pub struct RefreshCoordinator {
    store: FeedStore,
    tx: mpsc::UnboundedSender<RefreshRequested>,
}

impl RefreshCoordinator {
    /// Create a coordinator for `store` and the queue that consumes its intents
    pub fn new(store: FeedStore) -> (Self, RefreshQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { store, tx }, RefreshQueue { rx })
    }

    pub fn phase(&self) -> Phase {
        Phase::of(&self.store.snapshot())
    }

    /// Handle one trigger. Returns whether a refresh was requested.
    pub fn handle(&self, trigger: Trigger) -> bool {
        let Some(request) = decide(trigger, &self.store.snapshot()) else {
            tracing::trace!("Ignoring {:?} before first load", trigger);
            return false;
        };
        let _ = self.store.events().send(FeedEvent::RefreshRequested {
            reason: request.reason,
        });
        self.tx.send(request).is_ok()
    }

    /// Listen to a trigger source until the returned guard is dropped
    pub fn attach<S>(&self, triggers: S) -> TriggerGuard
    where
        S: Stream<Item = Trigger> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            let mut triggers = Box::pin(triggers);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    next = triggers.next() => match next {
                        Some(trigger) => {
                            coordinator.handle(trigger);
                        }
                        None => break,
                    },
                }
            }
        });
        TriggerGuard { cancel, task }
    }
}

/// Keeps a trigger listener alive. Dropping it deregisters the listener.
pub struct TriggerGuard {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TriggerGuard {
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for TriggerGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Single consumer of refresh intents
pub struct RefreshQueue {
    rx: mpsc::UnboundedReceiver<RefreshRequested>,
}

impl RefreshQueue {
    /// Wait for the next intent, then fold in everything queued behind it
    pub async fn next_request(&mut self) -> Option<RefreshRequested> {
        let first = self.rx.recv().await?;
        // let triggers fired in the same turn land before draining
        tokio::task::yield_now().await;
        let mut batch = vec![first];
        while let Ok(request) = self.rx.try_recv() {
            batch.push(request);
        }
        if batch.len() > 1 {
            tracing::debug!("Coalesced {} refresh requests", batch.len());
        }
        coalesce(&batch)
    }

    /// Apply intents to the store until cancelled.
    ///
    /// Each refresh runs on its own task so a newer intent can supersede one
    /// still in flight.
    pub async fn run(mut self, store: FeedStore, cancel: CancellationToken) {
        loop {
            let request = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                request = self.next_request() => request,
            };
            let Some(request) = request else {
                break;
            };
            tracing::debug!("Refreshing feed ({})", request.reason);
            let store = store.clone();
            tokio::spawn(async move {
                if request.reason == RefreshReason::FilterChanged {
                    store.set_filter(request.filter).await;
                } else {
                    store.refresh(request.count_hint, request.filter).await;
                }
            });
        }
    }
}
