use dog_offload::{BoxError, OffloadError};
use thiserror::Error;

/// Result type for extended client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by the extended client and the queue services it wraps
#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected before any I/O; never retried internally
    #[error("{message}")]
    Validation { message: String },

    #[error("receiptHandle already has s3 pointer information")]
    AlreadyAugmented,

    #[error("receiptHandle does not have s3 pointer information")]
    NotAugmented,

    #[error(transparent)]
    Payload(#[from] OffloadError),

    #[error("Queue service call {operation} failed: {source}")]
    Queue {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: &'static str },
}

impl ClientError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a queue service error from any transport error
    pub fn queue<E>(operation: &'static str, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Queue {
            operation,
            source: error.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// True for caller errors detected before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::AlreadyAugmented)
    }

    /// True when the call context was cancelled, here or in the payload store
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Payload(err) => err.is_cancelled(),
            _ => false,
        }
    }
}
