use bytes::Bytes;
use std::collections::HashMap;

/// Message attributes keyed by name
pub type MessageAttributes = HashMap<String, MessageAttributeValue>;

/// A typed message attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttributeValue {
    /// `String`, `Number`, `Binary`, optionally with a custom `.suffix`
    pub data_type: String,
    pub string_value: Option<String>,
    pub binary_value: Option<Bytes>,
}

impl MessageAttributeValue {
    pub fn string<S: Into<String>>(value: S) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    pub fn number<N: ToString>(value: N) -> Self {
        Self {
            data_type: "Number".to_string(),
            string_value: Some(value.to_string()),
            binary_value: None,
        }
    }

    pub fn binary<B: Into<Bytes>>(value: B) -> Self {
        Self {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value.into()),
        }
    }
}
