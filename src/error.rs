// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to read directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failure class of a remote summarization call.
///
/// Only the transient classes and `Quota` are retried. `ContentTooLarge`
/// is terminal even when it arrives with a status code that is otherwise
/// in the retryable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    TransientNetwork,
    TransientStatus,
    Quota,
    ContentTooLarge,
    Unclassified,
}

impl RemoteErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            RemoteErrorKind::TransientNetwork
                | RemoteErrorKind::TransientStatus
                | RemoteErrorKind::Quota
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RemoteErrorKind::TransientNetwork => "network",
            RemoteErrorKind::TransientStatus => "transient_status",
            RemoteErrorKind::Quota => "rate_limit",
            RemoteErrorKind::ContentTooLarge => "content_too_large",
            RemoteErrorKind::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone)]
#[error("{kind} error{}: {message} (after {attempts} attempt(s))", status_suffix(.status))]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub status: Option<u16>,
    pub message: String,
    pub attempts: u32,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" [HTTP {}]", s)).unwrap_or_default()
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            attempts: 1,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::TransientNetwork, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Quota, message)
    }

    pub fn content_too_large(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::ContentTooLarge, message)
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unclassified, message)
    }
}
