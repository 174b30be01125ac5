//! Per-session live status, fed by stream events

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cui_api::{ContentBlock, StreamEvent, StreamSignal};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::FeedError;
use crate::events::FeedEvent;
use crate::metrics::ToolMetrics;

/// State of a session's live channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Error => "error",
        }
    }
}

/// Real-time overlay for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveStatus {
    pub connection: ConnectionState,
    /// Most recent payload event
    pub last_event: Option<StreamEvent>,
    pub last_event_time: Option<DateTime<Utc>>,
    /// Short human-readable description of what the session is doing
    pub current_status: String,
    pub metrics: ToolMetrics,
    /// Last transport failure, kept until the channel recovers
    pub error: Option<FeedError>,
}

impl LiveStatus {
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }
}

/// Describe what a payload event says the session is doing
pub fn status_text(event: &StreamEvent) -> Option<String> {
    match event {
        StreamEvent::System(init) if init.subtype == "init" => Some("Starting".to_string()),
        StreamEvent::System(_) => None,
        StreamEvent::Assistant(message) => {
            if let Some((name, _)) = message.tool_uses().last() {
                Some(format!("Using {}", name))
            } else if message
                .message
                .content
                .iter()
                .any(|b| matches!(b, ContentBlock::Thinking { .. }))
                && message.text().is_empty()
            {
                Some("Thinking".to_string())
            } else {
                Some("Responding".to_string())
            }
        }
        StreamEvent::User(_) => Some("Processing".to_string()),
        StreamEvent::PermissionRequest { data } => {
            Some(format!("Awaiting permission: {}", data.tool_name))
        }
        StreamEvent::Result(result) if result.is_error => Some("Failed".to_string()),
        StreamEvent::Result(_) => Some("Completed".to_string()),
        StreamEvent::Error { error } => Some(format!("Error: {}", error)),
        StreamEvent::Connected { .. } | StreamEvent::Closed => None,
    }
}

/// Table of live statuses keyed by session id.
///
/// Clones share the same table. A status may exist for a session the feed
/// has not fetched yet; the two are joined at read time.
#[derive(Clone, Default)]
pub struct LiveStatusTracker {
    statuses: Arc<Mutex<HashMap<String, LiveStatus>>>,
    event_tx: Option<broadcast::Sender<FeedEvent>>,
}

impl LiveStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce every change on `event_tx`
    pub fn with_events(event_tx: broadcast::Sender<FeedEvent>) -> Self {
        Self {
            statuses: Arc::default(),
            event_tx: Some(event_tx),
        }
    }

    /// A (re)connect attempt started for a session
    pub fn connecting(&self, session_id: &str) {
        self.update(session_id, |status| {
            status.connection = ConnectionState::Connecting;
        });
    }

    /// Apply one event from a session's stream
    pub fn on_event(&self, session_id: &str, event: StreamEvent) {
        self.update(session_id, |status| match event {
            StreamEvent::Closed => {
                status.connection = ConnectionState::Disconnected;
            }
            StreamEvent::Connected { .. } => {
                status.connection = ConnectionState::Connected;
                status.error = None;
            }
            StreamEvent::Error { error } => {
                status.connection = ConnectionState::Connected;
                status.current_status = format!("Error: {}", error);
            }
            event => {
                status.connection = ConnectionState::Connected;
                status.error = None;
                if let Some(text) = status_text(&event) {
                    status.current_status = text;
                }
                status.metrics.observe(&event);
                status.last_event = Some(event);
                status.last_event_time = Some(Utc::now());
            }
        });
    }

    /// The transport failed. Last event and metrics are kept.
    pub fn on_transport_error(&self, session_id: &str, error: &cui_api::Error) {
        tracing::debug!("Live stream for {} failed: {}", session_id, error);
        self.update(session_id, |status| {
            status.connection = ConnectionState::Error;
            status.error = Some(FeedError::from(error));
        });
    }

    /// The stream was closed on purpose
    pub fn close(&self, session_id: &str) {
        let changed = {
            let mut statuses = self.statuses.lock();
            match statuses.get_mut(session_id) {
                Some(status) if status.connection != ConnectionState::Disconnected => {
                    status.connection = ConnectionState::Disconnected;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.notify(session_id);
        }
    }

    /// Route a subscription signal to the matching transition
    pub fn apply(&self, session_id: &str, signal: StreamSignal) {
        match signal {
            StreamSignal::Opened => self.connecting(session_id),
            StreamSignal::Event(event) => self.on_event(session_id, event),
            StreamSignal::Failed(error) => self.on_transport_error(session_id, &error),
            StreamSignal::Closed => self.close(session_id),
        }
    }

    pub fn get(&self, session_id: &str) -> Option<LiveStatus> {
        self.statuses.lock().get(session_id).cloned()
    }

    pub fn remove(&self, session_id: &str) -> Option<LiveStatus> {
        self.statuses.lock().remove(session_id)
    }

    /// Copy of the whole table
    pub fn snapshot(&self) -> HashMap<String, LiveStatus> {
        self.statuses.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.statuses.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.lock().is_empty()
    }

    fn update(&self, session_id: &str, f: impl FnOnce(&mut LiveStatus)) {
        {
            let mut statuses = self.statuses.lock();
            let status = statuses.entry(session_id.to_string()).or_default();
            f(status);
        }
        self.notify(session_id);
    }

    fn notify(&self, session_id: &str) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(FeedEvent::LiveStatusChanged {
                session_id: session_id.to_string(),
            });
        }
    }
}
