//! Backend abstraction consumed by the feed engine

use async_trait::async_trait;

use crate::{
    ConversationPage, ConversationQuery, Result, SessionEventStream, StartConversationRequest,
    StartConversationResponse,
};

/// Everything the console needs from the conversation backend
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Fetch one page of conversation summaries, most recent first
    async fn fetch_conversations(&self, query: &ConversationQuery) -> Result<ConversationPage>;

    /// Start a new conversation
    async fn start_conversation(
        &self,
        request: &StartConversationRequest,
    ) -> Result<StartConversationResponse>;

    /// Subscribe to the live event stream of a running conversation
    async fn subscribe(&self, streaming_id: &str) -> Result<SessionEventStream>;
}
