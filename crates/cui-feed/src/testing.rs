//! Scripted backend and fixtures shared by the unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use cui_api::{
    ConversationBackend, ConversationPage, ConversationQuery, ConversationStatus,
    ConversationSummary, Cursor, Error, Result, SessionEventStream, StartConversationRequest,
    StartConversationResponse, StreamSignal,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

pub fn summary(id: &str) -> ConversationSummary {
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    ConversationSummary {
        session_id: id.to_string(),
        project_path: "/work/repo".to_string(),
        summary: format!("conversation {id}"),
        custom_name: None,
        created_at: at,
        updated_at: at,
        message_count: 1,
        model: None,
        archived: false,
        continuation_session_id: None,
        status: ConversationStatus::Completed,
        streaming_id: None,
    }
}

pub fn live_summary(id: &str, streaming_id: &str) -> ConversationSummary {
    ConversationSummary {
        status: ConversationStatus::Ongoing,
        streaming_id: Some(streaming_id.to_string()),
        ..summary(id)
    }
}

pub fn page<S: AsRef<str>>(ids: &[S], next: Option<&str>) -> ConversationPage {
    ConversationPage {
        items: ids.iter().map(|id| summary(id.as_ref())).collect(),
        next_cursor: next.map(Cursor::new),
        has_more: next.is_some(),
    }
}

/// Backend whose fetches resolve only when the test releases them.
///
/// Fetches take gates in call order. A fetch with no gate queued fails.
#[derive(Default)]
pub struct GatedBackend {
    gates: Mutex<VecDeque<oneshot::Receiver<Result<ConversationPage>>>>,
    queries: Mutex<Vec<ConversationQuery>>,
    streams: Mutex<HashMap<String, mpsc::UnboundedReceiver<StreamSignal>>>,
    subscribed: Mutex<Vec<String>>,
}

impl GatedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a gate for the next fetch and return its release handle
    pub fn gate(&self) -> oneshot::Sender<Result<ConversationPage>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push_back(rx);
        tx
    }

    /// Queue an already-released response
    pub fn respond(&self, result: Result<ConversationPage>) {
        let _ = self.gate().send(result);
    }

    pub fn queries(&self) -> Vec<ConversationQuery> {
        self.queries.lock().clone()
    }

    /// Register a live stream; signals sent on the handle reach the subscriber
    pub fn stream(&self, streaming_id: &str) -> mpsc::UnboundedSender<StreamSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().insert(streaming_id.to_string(), rx);
        tx
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.subscribed.lock().clone()
    }
}

#[async_trait]
impl ConversationBackend for GatedBackend {
    async fn fetch_conversations(&self, query: &ConversationQuery) -> Result<ConversationPage> {
        self.queries.lock().push(query.clone());
        let gate = self.gates.lock().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(Error::Network("gate dropped".into()))),
            None => Err(Error::Network("no response scripted".into())),
        }
    }

    async fn start_conversation(
        &self,
        request: &StartConversationRequest,
    ) -> Result<StartConversationResponse> {
        Ok(StartConversationResponse {
            session_id: format!("new-{}", request.initial_prompt.len()),
            streaming_id: None,
        })
    }

    async fn subscribe(&self, streaming_id: &str) -> Result<SessionEventStream> {
        self.subscribed.lock().push(streaming_id.to_string());
        let rx = self.streams.lock().remove(streaming_id);
        match rx {
            Some(rx) => Ok(Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))),
            None => Err(Error::StreamConnection(format!("unknown stream {streaming_id}"))),
        }
    }
}
