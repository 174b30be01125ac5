//! Live stream subscriptions for running conversations

use std::collections::HashMap;
use std::sync::Arc;

use cui_api::{ConversationBackend, ConversationSummary, StreamSignal};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::live_status::LiveStatusTracker;

struct Subscription {
    streaming_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps one stream subscription per running conversation and pumps its
/// signals into a [`LiveStatusTracker`].
///
/// Dropping the manager closes every subscription.
pub struct LiveStreams {
    backend: Arc<dyn ConversationBackend>,
    tracker: LiveStatusTracker,
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

impl LiveStreams {
    pub fn new(backend: Arc<dyn ConversationBackend>, tracker: LiveStatusTracker) -> Self {
        Self {
            backend,
            tracker,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn tracker(&self) -> &LiveStatusTracker {
        &self.tracker
    }

    /// Subscribe to every running conversation that has no live subscription.
    /// Returns how many new subscriptions were opened.
    ///
    /// Subscriptions whose stream already ended are forgotten first.
    pub fn sync(&self, conversations: &[ConversationSummary]) -> usize {
        self.subscriptions
            .lock()
            .retain(|_, subscription| !subscription.task.is_finished());
        let mut opened = 0;
        for conversation in conversations {
            let Some(streaming_id) = conversation.streaming_id.as_deref() else {
                continue;
            };
            if conversation.is_live() && self.subscribe(&conversation.session_id, streaming_id) {
                opened += 1;
            }
        }
        opened
    }

    /// Open a subscription unless one is already running for this session
    pub fn subscribe(&self, session_id: &str, streaming_id: &str) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        if let Some(existing) = subscriptions.get(session_id) {
            if !existing.task.is_finished() && existing.streaming_id == streaming_id {
                return false;
            }
            existing.cancel.cancel();
        }

        tracing::debug!("Subscribing to live stream {} for {}", streaming_id, session_id);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(pump(
            Arc::clone(&self.backend),
            self.tracker.clone(),
            session_id.to_string(),
            streaming_id.to_string(),
            cancel.clone(),
        ));
        subscriptions.insert(
            session_id.to_string(),
            Subscription {
                streaming_id: streaming_id.to_string(),
                cancel,
                task,
            },
        );
        true
    }

    /// Close a session's subscription on purpose
    pub fn close(&self, session_id: &str) -> bool {
        let removed = self.subscriptions.lock().remove(session_id);
        match removed {
            Some(subscription) => {
                subscription.cancel.cancel();
                self.tracker.close(session_id);
                true
            }
            None => false,
        }
    }

    pub fn close_all(&self) {
        let drained: Vec<(String, Subscription)> = self.subscriptions.lock().drain().collect();
        for (session_id, subscription) in drained {
            subscription.cancel.cancel();
            self.tracker.close(&session_id);
        }
    }

    /// Sessions with a running subscription
    pub fn active(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .subscriptions
            .lock()
            .iter()
            .filter(|(_, s)| !s.task.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Subscriptions held, finished or not
    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }

    pub fn is_subscribed(&self, session_id: &str) -> bool {
        self.subscriptions
            .lock()
            .get(session_id)
            .is_some_and(|s| !s.task.is_finished())
    }
}

impl Drop for LiveStreams {
    fn drop(&mut self) {
        self.close_all();
    }
}

async fn pump(
    backend: Arc<dyn ConversationBackend>,
    tracker: LiveStatusTracker,
    session_id: String,
    streaming_id: String,
    cancel: CancellationToken,
) {
    tracker.connecting(&session_id);
    let subscribed = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = backend.subscribe(&streaming_id) => result,
    };
    let mut stream = match subscribed {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("Could not subscribe to {}: {}", streaming_id, e);
            tracker.on_transport_error(&session_id, &e);
            return;
        }
    };

    // an exhausted stream after a failure stays in the error state
    let mut failed = false;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            signal = stream.next() => match signal {
                Some(StreamSignal::Failed(error)) => {
                    failed = true;
                    tracker.on_transport_error(&session_id, &error);
                }
                Some(StreamSignal::Closed) => {
                    tracker.close(&session_id);
                    break;
                }
                Some(signal) => {
                    failed = false;
                    tracker.apply(&session_id, signal);
                }
                None => {
                    if !failed {
                        tracker.close(&session_id);
                    }
                    break;
                }
            },
        }
    }
    tracing::debug!("Live stream {} for {} finished", streaming_id, session_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_status::ConnectionState;
    use crate::testing::{GatedBackend, live_summary, summary};
    use cui_api::StreamEvent;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn edit_event() -> StreamEvent {
        serde_json::from_value(serde_json::json!({
            "type": "assistant",
            "message": {"content": [{
                "type": "tool_use", "id": "e", "name": "Edit",
                "input": {"file_path": "a.rs", "old_string": "a\n", "new_string": "b\nc\n"}
            }]}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sync_subscribes_only_running_conversations() {
        let backend = GatedBackend::new();
        let _abc = backend.stream("s-abc");
        let tracker = LiveStatusTracker::new();
        let streams = LiveStreams::new(backend.clone(), tracker);

        let feed = vec![summary("done"), live_summary("abc", "s-abc")];
        assert_eq!(streams.sync(&feed), 1);
        settle().await;
        assert_eq!(backend.subscribed(), vec!["s-abc".to_string()]);
        assert_eq!(streams.active(), vec!["abc".to_string()]);

        // already subscribed
        assert_eq!(streams.sync(&feed), 0);
    }

    #[tokio::test]
    async fn test_signals_reach_tracker() {
        let backend = GatedBackend::new();
        let tx = backend.stream("s-abc");
        let tracker = LiveStatusTracker::new();
        let streams = LiveStreams::new(backend.clone(), tracker.clone());
        streams.subscribe("abc", "s-abc");
        settle().await;
        assert_eq!(tracker.get("abc").unwrap().connection, ConnectionState::Connecting);

        tx.send(StreamSignal::Opened).unwrap();
        tx.send(StreamSignal::Event(edit_event())).unwrap();
        settle().await;
        let status = tracker.get("abc").unwrap();
        assert!(status.is_connected());
        assert_eq!(status.metrics.edit_count, 1);
        assert_eq!(status.metrics.lines_added, 2);

        tx.send(StreamSignal::Failed(cui_api::Error::StreamConnection("reset".into())))
            .unwrap();
        settle().await;
        let status = tracker.get("abc").unwrap();
        assert_eq!(status.connection, ConnectionState::Error);
        assert_eq!(status.metrics.edit_count, 1);

        // source gave up after the failure
        drop(tx);
        settle().await;
        assert_eq!(tracker.get("abc").unwrap().connection, ConnectionState::Error);
        assert!(!streams.is_subscribed("abc"));
    }

    #[tokio::test]
    async fn test_close_disconnects_and_stops_pumping() {
        let backend = GatedBackend::new();
        let tx = backend.stream("s-abc");
        let tracker = LiveStatusTracker::new();
        let streams = LiveStreams::new(backend.clone(), tracker.clone());
        streams.subscribe("abc", "s-abc");
        tx.send(StreamSignal::Event(edit_event())).unwrap();
        settle().await;

        assert!(streams.close("abc"));
        assert_eq!(tracker.get("abc").unwrap().connection, ConnectionState::Disconnected);

        let _ = tx.send(StreamSignal::Event(edit_event()));
        settle().await;
        let status = tracker.get("abc").unwrap();
        assert_eq!(status.connection, ConnectionState::Disconnected);
        assert_eq!(status.metrics.edit_count, 1);
        assert!(!streams.close("abc"));
    }

    #[tokio::test]
    async fn test_subscribe_failure_marks_error() {
        let backend = GatedBackend::new();
        let tracker = LiveStatusTracker::new();
        let streams = LiveStreams::new(backend.clone(), tracker.clone());
        streams.subscribe("abc", "missing");
        settle().await;

        let status = tracker.get("abc").unwrap();
        assert_eq!(status.connection, ConnectionState::Error);
        assert_eq!(
            status.error.map(|e| e.kind),
            Some(cui_api::ErrorKind::StreamConnection)
        );
    }

    #[tokio::test]
    async fn test_sync_forgets_finished_streams() {
        let backend = GatedBackend::new();
        let abc = backend.stream("s-abc");
        let _xyz = backend.stream("s-xyz");
        let tracker = LiveStatusTracker::new();
        let streams = LiveStreams::new(backend.clone(), tracker.clone());

        let feed = vec![live_summary("abc", "s-abc"), live_summary("xyz", "s-xyz")];
        assert_eq!(streams.sync(&feed), 2);
        settle().await;
        assert_eq!(streams.len(), 2);

        abc.send(StreamSignal::Closed).unwrap();
        settle().await;
        assert_eq!(tracker.get("abc").unwrap().connection, ConnectionState::Disconnected);
        assert_eq!(streams.len(), 2);

        // abc left the feed after finishing
        assert_eq!(streams.sync(&[live_summary("xyz", "s-xyz")]), 0);
        assert_eq!(streams.len(), 1);
        assert_eq!(streams.active(), vec!["xyz".to_string()]);

        // a stream that failed to open is forgotten too
        streams.subscribe("gone", "missing");
        settle().await;
        streams.sync(&[]);
        assert_eq!(streams.len(), 1);
        assert!(!streams.is_empty());
    }

    #[tokio::test]
    async fn test_drop_closes_everything() {
        let backend = GatedBackend::new();
        let tx = backend.stream("s-abc");
        let tracker = LiveStatusTracker::new();
        {
            let streams = LiveStreams::new(backend.clone(), tracker.clone());
            streams.sync(&[live_summary("abc", "s-abc")]);
            settle().await;
        }
        settle().await;
        assert!(tx.is_closed());
        assert_eq!(tracker.get("abc").unwrap().connection, ConnectionState::Disconnected);
    }
}
