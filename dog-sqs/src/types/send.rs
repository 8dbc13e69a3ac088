use super::MessageAttributes;

/// Send a single message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendMessageRequest {
    pub queue_url: String,
    pub message_body: String,
    pub message_attributes: MessageAttributes,
    pub delay_seconds: Option<i32>,
    pub message_group_id: Option<String>,
    pub message_deduplication_id: Option<String>,
}

impl SendMessageRequest {
    pub fn new<Q: Into<String>, B: Into<String>>(queue_url: Q, message_body: B) -> Self {
        Self {
            queue_url: queue_url.into(),
            message_body: message_body.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute<S: Into<String>>(mut self, name: S, value: super::MessageAttributeValue) -> Self {
        self.message_attributes.insert(name.into(), value);
        self
    }

    pub fn with_delay_seconds(mut self, delay_seconds: i32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }

    pub fn with_message_group_id<S: Into<String>>(mut self, group_id: S) -> Self {
        self.message_group_id = Some(group_id.into());
        self
    }

    pub fn with_message_deduplication_id<S: Into<String>>(mut self, dedup_id: S) -> Self {
        self.message_deduplication_id = Some(dedup_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageResponse {
    pub message_id: Option<String>,
    pub md5_of_message_body: Option<String>,
    pub sequence_number: Option<String>,
}

/// Send up to ten messages in one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendMessageBatchRequest {
    pub queue_url: String,
    pub entries: Vec<SendMessageBatchEntry>,
}

impl SendMessageBatchRequest {
    pub fn new<Q: Into<String>>(queue_url: Q, entries: Vec<SendMessageBatchEntry>) -> Self {
        Self {
            queue_url: queue_url.into(),
            entries,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendMessageBatchEntry {
    /// Caller-chosen id, unique within the batch
    pub id: String,
    pub message_body: String,
    pub message_attributes: MessageAttributes,
    pub delay_seconds: Option<i32>,
    pub message_group_id: Option<String>,
    pub message_deduplication_id: Option<String>,
}

impl SendMessageBatchEntry {
    pub fn new<I: Into<String>, B: Into<String>>(id: I, message_body: B) -> Self {
        Self {
            id: id.into(),
            message_body: message_body.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute<S: Into<String>>(mut self, name: S, value: super::MessageAttributeValue) -> Self {
        self.message_attributes.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageBatchResultEntry {
    pub id: String,
    pub message_id: String,
    pub md5_of_message_body: String,
    pub sequence_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageBatchResponse {
    pub successful: Vec<SendMessageBatchResultEntry>,
    pub failed: Vec<BatchResultError>,
}

/// Per-entry failure of a batch call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResultError {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}
