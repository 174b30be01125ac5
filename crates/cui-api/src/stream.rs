//! Live event stream types and the SSE adapter

use std::pin::Pin;
use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource, retry::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::error::Error;

/// Content block inside an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantStreamMessage {
    pub message: AssistantMessage,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
}

impl AssistantStreamMessage {
    /// Tool invocations in this message, in order
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.message.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } => Some((name.as_str(), input)),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.message
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserMessage {
    /// Either a plain string or a list of content blocks
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStreamMessage {
    pub message: UserMessage,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultStreamMessage {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInitMessage {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, rename = "permissionMode")]
    pub permission_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: serde_json::Value,
    #[serde(default)]
    pub status: Option<String>,
}

/// Events delivered on a conversation's live stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Server acknowledged the subscription
    Connected {
        #[serde(default, alias = "streamingId")]
        streaming_id: Option<String>,
    },
    Assistant(AssistantStreamMessage),
    User(UserStreamMessage),
    Result(ResultStreamMessage),
    System(SystemInitMessage),
    PermissionRequest { data: PermissionRequest },
    /// The conversation process reported an error
    Error { error: String },
    /// Server closed the stream on purpose
    Closed,
}

impl StreamEvent {
    /// Whether this event carries a conversation payload (as opposed to stream control)
    pub fn is_payload(&self) -> bool {
        !matches!(
            self,
            StreamEvent::Connected { .. } | StreamEvent::Error { .. } | StreamEvent::Closed
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Connected { .. } => "connected",
            StreamEvent::Assistant(_) => "assistant",
            StreamEvent::User(_) => "user",
            StreamEvent::Result(_) => "result",
            StreamEvent::System(_) => "system",
            StreamEvent::PermissionRequest { .. } => "permission_request",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Closed => "closed",
        }
    }
}

/// What a subscription reports to its consumer
#[derive(Debug)]
pub enum StreamSignal {
    /// Transport (re)opened
    Opened,
    Event(StreamEvent),
    /// Transport failed; the underlying source may still retry
    Failed(Error),
    /// Stream ended cleanly
    Closed,
}

/// A stream of signals for one conversation
pub type SessionEventStream = Pin<Box<dyn Stream<Item = StreamSignal> + Send>>;

/// Reconnect configuration for the live stream
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of reconnect attempts
    pub max_retries: u32,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    pub(crate) fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            self.initial_delay,
            self.backoff_multiplier,
            Some(self.max_delay),
            Some(self.max_retries as usize),
        )
    }
}

/// Turn an SSE source into a signal stream
pub(crate) fn create_stream(mut event_source: EventSource) -> impl Stream<Item = StreamSignal> {
    stream! {
        while let Some(event_result) = event_source.next().await {
            match event_result {
                Ok(Event::Open) => {
                    yield StreamSignal::Opened;
                }
                Ok(Event::Message(message)) => {
                    if message.data.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<StreamEvent>(&message.data) {
                        Ok(StreamEvent::Closed) => {
                            yield StreamSignal::Event(StreamEvent::Closed);
                            event_source.close();
                            yield StreamSignal::Closed;
                            break;
                        }
                        Ok(event) => yield StreamSignal::Event(event),
                        Err(e) => {
                            tracing::debug!("Skipping unreadable stream event ({}): {}", e, message.data);
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    event_source.close();
                    yield StreamSignal::Closed;
                    break;
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, _))
                    if status.as_u16() == 401 || status.as_u16() == 403 =>
                {
                    event_source.close();
                    yield StreamSignal::Failed(Error::Auth(format!("stream rejected with {}", status)));
                    break;
                }
                Err(e) => {
                    tracing::warn!("Live stream error: {}", e);
                    yield StreamSignal::Failed(Error::StreamConnection(e.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> StreamEvent {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_assistant_with_tool_use() {
        let event = parse(serde_json::json!({
            "type": "assistant",
            "session_id": "abc",
            "message": {
                "content": [
                    {"type": "text", "text": "Editing now"},
                    {"type": "tool_use", "id": "t1", "name": "Edit",
                     "input": {"file_path": "a.rs", "old_string": "a", "new_string": "b"}},
                    {"type": "server_tool_use"}
                ]
            }
        }));
        let StreamEvent::Assistant(msg) = event else {
            panic!("expected assistant event");
        };
        assert_eq!(msg.text(), "Editing now");
        let names: Vec<&str> = msg.tool_uses().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Edit"]);
    }

    #[test]
    fn test_parse_system_init() {
        let event = parse(serde_json::json!({
            "type": "system",
            "subtype": "init",
            "cwd": "/work",
            "model": "sonnet",
            "tools": ["Read", "Edit"],
            "permissionMode": "default"
        }));
        assert_eq!(event.kind(), "system");
        assert!(event.is_payload());
    }

    #[test]
    fn test_parse_control_events() {
        let connected = parse(serde_json::json!({"type": "connected", "streamingId": "s1"}));
        assert_eq!(
            connected,
            StreamEvent::Connected {
                streaming_id: Some("s1".into())
            }
        );
        assert!(!connected.is_payload());
        assert_eq!(parse(serde_json::json!({"type": "closed"})), StreamEvent::Closed);
    }

    #[test]
    fn test_parse_permission_request() {
        let event = parse(serde_json::json!({
            "type": "permission_request",
            "data": {"id": "p1", "toolName": "Bash", "toolInput": {"command": "ls"}}
        }));
        let StreamEvent::PermissionRequest { data } = event else {
            panic!("expected permission request");
        };
        assert_eq!(data.tool_name, "Bash");
    }

    #[test]
    fn test_retry_delay_caps_at_max() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(30));
    }
}
