//! cui-api: wire types and transport for the cui backend
//!
//! This crate provides the conversation types, the live stream event model,
//! and a reqwest-based client behind the [`ConversationBackend`] trait.

pub mod backend;
pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use backend::ConversationBackend;
pub use client::{ApiClient, ClientConfig, DEFAULT_PAGE_SIZE};
pub use error::{Error, ErrorKind, Result};
pub use stream::{
    AssistantStreamMessage, ContentBlock, PermissionRequest, ResultStreamMessage, RetryConfig,
    SessionEventStream, StreamEvent, StreamSignal, SystemInitMessage, UserStreamMessage,
};
pub use types::*;
