//! Error types for cui-feed

use cui_api::ErrorKind;

/// A failure captured into feed or live-status state.
///
/// Unlike `cui_api::Error` this is cheap to clone, so snapshots can carry it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FeedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FeedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

impl From<cui_api::Error> for FeedError {
    fn from(error: cui_api::Error) -> Self {
        Self::from(&error)
    }
}

impl From<&cui_api::Error> for FeedError {
    fn from(error: &cui_api::Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
