//! Core types shared by the HTTP client and the feed engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a conversation as reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Completed,
    Ongoing,
    Pending,
}

/// One row of the conversation feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Backend-issued session identifier, unique within a feed
    pub session_id: String,
    /// Working directory the conversation ran in
    pub project_path: String,
    /// Preview text (first prompt or generated summary)
    #[serde(default)]
    pub summary: String,
    /// User-assigned title, overrides the summary when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub archived: bool,
    /// Session that continues this one, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_session_id: Option<String>,
    #[serde(default)]
    pub status: ConversationStatus,
    /// Identifier of the live event stream while the conversation is running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_id: Option<String>,
}

impl ConversationSummary {
    /// Display title: custom name if set, otherwise the summary
    pub fn title(&self) -> &str {
        match self.custom_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.summary,
        }
    }

    /// Whether this conversation has a follow-up thread
    pub fn has_continuation(&self) -> bool {
        self.continuation_session_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }

    /// Whether the backend reports a live stream for this conversation
    pub fn is_live(&self) -> bool {
        self.status == ConversationStatus::Ongoing && self.streaming_id.is_some()
    }
}

/// Backend query restriction derived from the active tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_continuation: Option<bool>,
}

impl FilterSpec {
    /// No restriction
    pub const ALL: FilterSpec = FilterSpec {
        archived: None,
        has_continuation: None,
    };

    pub fn is_empty(&self) -> bool {
        self.archived.is_none() && self.has_continuation.is_none()
    }

    /// Whether a summary satisfies this filter
    pub fn matches(&self, summary: &ConversationSummary) -> bool {
        self.archived.is_none_or(|a| a == summary.archived)
            && self
                .has_continuation
                .is_none_or(|c| c == summary.has_continuation())
    }
}

/// Opaque pagination token handed back by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters for one page fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationQuery {
    pub filter: FilterSpec,
    /// Position to resume from; `None` fetches the first page
    pub cursor: Option<Cursor>,
    /// Request at least this many items
    pub count_hint: Option<usize>,
}

impl ConversationQuery {
    pub fn first_page(filter: FilterSpec) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn with_count_hint(mut self, count_hint: Option<usize>) -> Self {
        self.count_hint = count_hint;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// One page of the feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationPage {
    pub items: Vec<ConversationSummary>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

/// Permission mode passed through to the assistant process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    AcceptEdits,
    BypassPermissions,
    Plan,
}

impl PermissionMode {
    /// Parse a user-facing name; `default` and unknown values mean "let the backend decide"
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "acceptedits" | "accept-edits" => Some(PermissionMode::AcceptEdits),
            "bypasspermissions" | "bypass-permissions" => Some(PermissionMode::BypassPermissions),
            "plan" => Some(PermissionMode::Plan),
            _ => None,
        }
    }
}

/// Request body for starting a new conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    pub working_directory: String,
    pub initial_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<PermissionMode>,
}

impl StartConversationRequest {
    pub fn new(working_directory: impl Into<String>, initial_prompt: impl Into<String>) -> Self {
        Self {
            working_directory: working_directory.into(),
            initial_prompt: initial_prompt.into(),
            model: None,
            permission_mode: None,
        }
    }

    /// Set the model; `default` means "omit"
    pub fn with_model(mut self, model: Option<&str>) -> Self {
        self.model = model
            .filter(|m| !m.is_empty() && *m != "default")
            .map(str::to_string);
        self
    }

    pub fn with_permission_mode(mut self, mode: Option<PermissionMode>) -> Self {
        self.permission_mode = mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationResponse {
    pub session_id: String,
    #[serde(default)]
    pub streaming_id: Option<String>,
}
