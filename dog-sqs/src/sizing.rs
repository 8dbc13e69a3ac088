//! Byte accounting for message bodies and attributes.

use crate::types::{MessageAttributes, SendMessageBatchEntry, SendMessageRequest};

/// UTF-8 encoded length of `text`; absent text is 0
pub fn byte_size(text: Option<&str>) -> usize {
    text.map_or(0, str::len)
}

/// Sum of key, string value, data type and binary value sizes over all attributes.
///
/// Every attribute carries a data type, so an attribute without a value still counts its
/// key and its data type.
pub fn attributes_size(attributes: &MessageAttributes) -> usize {
    attributes
        .iter()
        .map(|(name, value)| {
            name.len()
                + byte_size(value.string_value.as_deref())
                + value.data_type.len()
                + value.binary_value.as_ref().map_or(0, |b| b.len())
        })
        .sum()
}

/// True iff body plus attributes exceed `limit`; exactly `limit` is not large
pub fn is_large(body: &str, attributes: &MessageAttributes, limit: usize) -> bool {
    byte_size(Some(body)) + attributes_size(attributes) > limit
}

/// An outgoing message whose body may be replaced by a payload pointer.
///
/// Single sends and batch entries go through the same offload path via this trait.
pub trait OffloadCandidate: Send {
    fn message_body(&self) -> &str;
    fn message_attributes(&self) -> &MessageAttributes;
    fn set_message_body(&mut self, body: String);
    fn message_attributes_mut(&mut self) -> &mut MessageAttributes;

    fn is_large(&self, limit: usize) -> bool {
        is_large(self.message_body(), self.message_attributes(), limit)
    }
}

impl OffloadCandidate for SendMessageRequest {
    fn message_body(&self) -> &str {
        &self.message_body
    }

    fn message_attributes(&self) -> &MessageAttributes {
        &self.message_attributes
    }

    fn set_message_body(&mut self, body: String) {
        self.message_body = body;
    }

    fn message_attributes_mut(&mut self) -> &mut MessageAttributes {
        &mut self.message_attributes
    }
}

impl OffloadCandidate for SendMessageBatchEntry {
    fn message_body(&self) -> &str {
        &self.message_body
    }

    fn message_attributes(&self) -> &MessageAttributes {
        &self.message_attributes
    }

    fn set_message_body(&mut self, body: String) {
        self.message_body = body;
    }

    fn message_attributes_mut(&mut self) -> &mut MessageAttributes {
        &mut self.message_attributes
    }
}
