use super::BatchResultError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageRequest {
    pub queue_url: String,
    pub receipt_handle: String,
}

impl DeleteMessageRequest {
    pub fn new<Q: Into<String>, H: Into<String>>(queue_url: Q, receipt_handle: H) -> Self {
        Self {
            queue_url: queue_url.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageBatchRequest {
    pub queue_url: String,
    pub entries: Vec<DeleteMessageBatchEntry>,
}

impl DeleteMessageBatchRequest {
    pub fn new<Q: Into<String>>(queue_url: Q, entries: Vec<DeleteMessageBatchEntry>) -> Self {
        Self {
            queue_url: queue_url.into(),
            entries,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageBatchEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl DeleteMessageBatchEntry {
    pub fn new<I: Into<String>, H: Into<String>>(id: I, receipt_handle: H) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMessageBatchResponse {
    /// Ids of the entries that were deleted
    pub successful: Vec<String>,
    pub failed: Vec<BatchResultError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeMessageVisibilityRequest {
    pub queue_url: String,
    pub receipt_handle: String,
    pub visibility_timeout: i32,
}

impl ChangeMessageVisibilityRequest {
    pub fn new<Q: Into<String>, H: Into<String>>(
        queue_url: Q,
        receipt_handle: H,
        visibility_timeout: i32,
    ) -> Self {
        Self {
            queue_url: queue_url.into(),
            receipt_handle: receipt_handle.into(),
            visibility_timeout,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeMessageVisibilityBatchRequest {
    pub queue_url: String,
    pub entries: Vec<ChangeMessageVisibilityBatchEntry>,
}

impl ChangeMessageVisibilityBatchRequest {
    pub fn new<Q: Into<String>>(queue_url: Q, entries: Vec<ChangeMessageVisibilityBatchEntry>) -> Self {
        Self {
            queue_url: queue_url.into(),
            entries,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeMessageVisibilityBatchEntry {
    pub id: String,
    pub receipt_handle: String,
    pub visibility_timeout: i32,
}

impl ChangeMessageVisibilityBatchEntry {
    pub fn new<I: Into<String>, H: Into<String>>(id: I, receipt_handle: H, visibility_timeout: i32) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
            visibility_timeout,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeMessageVisibilityBatchResponse {
    /// Ids of the entries whose visibility was changed
    pub successful: Vec<String>,
    pub failed: Vec<BatchResultError>,
}
