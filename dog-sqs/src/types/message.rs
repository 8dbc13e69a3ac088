use std::collections::HashMap;

use super::MessageAttributes;

/// A message as returned by receive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub message_id: Option<String>,
    /// Opaque handle required to delete the message or change its visibility
    pub receipt_handle: String,
    pub body: String,
    pub md5_of_body: Option<String>,
    /// System attributes (`SentTimestamp`, `ApproximateReceiveCount`, ...)
    pub attributes: HashMap<String, String>,
    pub message_attributes: MessageAttributes,
}

/// Receive up to ten messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageRequest {
    pub queue_url: String,
    pub max_number_of_messages: Option<i32>,
    pub visibility_timeout: Option<i32>,
    pub wait_time_seconds: Option<i32>,
    /// Message attributes to return; `All` or `prefix.*` select groups
    pub message_attribute_names: Vec<String>,
    /// System attributes to return
    pub message_system_attribute_names: Vec<String>,
}

impl ReceiveMessageRequest {
    pub fn new<Q: Into<String>>(queue_url: Q) -> Self {
        Self {
            queue_url: queue_url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_number_of_messages(mut self, max: i32) -> Self {
        self.max_number_of_messages = Some(max);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }

    pub fn with_message_attribute_name<S: Into<String>>(mut self, name: S) -> Self {
        self.message_attribute_names.push(name.into());
        self
    }

    pub fn with_message_system_attribute_name<S: Into<String>>(mut self, name: S) -> Self {
        self.message_system_attribute_names.push(name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiveMessageResponse {
    pub messages: Vec<Message>,
}
