use thiserror::Error;

/// Result type for payload offloading operations
pub type OffloadResult<T> = Result<T, OffloadError>;

/// Boxed transport or service error reported by a blob client
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while storing, fetching or deleting an offloaded payload
#[derive(Error, Debug)]
pub enum OffloadError {
    #[error("Failed to read the S3 object pointer from given string {pointer}")]
    PointerFormat {
        pointer: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to store the message content in an S3 object {key} in bucket {bucket}")]
    StoreFailure {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to get the S3 object {key} from {bucket}")]
    FetchFailure {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failure when handling the message which was read from S3 object {key} from bucket {bucket}")]
    ReadFailure {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to delete S3 object {key} in bucket {bucket}")]
    DeleteFailure {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: &'static str },
}

impl OffloadError {
    /// Create a pointer format error
    pub fn pointer_format<S: Into<String>>(pointer: S, source: serde_json::Error) -> Self {
        Self::PointerFormat {
            pointer: pointer.into(),
            source,
        }
    }

    /// Create a store failure from any transport error
    pub fn store_failure<E>(bucket: &str, key: &str, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::StoreFailure {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: error.into(),
        }
    }

    /// Create a fetch failure from any transport error
    pub fn fetch_failure<E>(bucket: &str, key: &str, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::FetchFailure {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: error.into(),
        }
    }

    /// Create a read failure from a stream or decoding error
    pub fn read_failure<E>(bucket: &str, key: &str, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::ReadFailure {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: error.into(),
        }
    }

    /// Create a delete failure from any transport error
    pub fn delete_failure<E>(bucket: &str, key: &str, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::DeleteFailure {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: error.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// Check if this error came from a cancelled call context
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
