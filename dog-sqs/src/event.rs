//! SQS event-source batches as delivered to serverless functions.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::client::ReceivedMessage;
use crate::constants::RESERVED_ATTRIBUTE_NAME;
use crate::{CallCtx, ClientResult};

/// A batch of SQS records handed to a function by its event source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SqsEventRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsEventRecord {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub receipt_handle: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub md5_of_body: Option<String>,
    #[serde(default)]
    pub md5_of_message_attributes: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_attributes: HashMap<String, SqsEventMessageAttribute>,
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(rename = "eventSourceARN", default)]
    pub event_source_arn: Option<String>,
    #[serde(default)]
    pub aws_region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsEventMessageAttribute {
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default, with = "base64_bytes")]
    pub binary_value: Option<Bytes>,
    #[serde(default)]
    pub string_list_values: Vec<String>,
    /// Base64 text, as delivered
    #[serde(default)]
    pub binary_list_values: Vec<String>,
    pub data_type: String,
}

/// Rehydrates offloaded payloads in event-source batches
#[async_trait]
pub trait LambdaEventClient: Send + Sync {
    /// Replace every offloaded record body with its payload and augment its receipt handle.
    ///
    /// Records are fetched concurrently; any failure fails the whole batch. No-op when
    /// offloading is disabled.
    async fn fetch_payloads(&self, ctx: &CallCtx, event: &mut SqsEvent) -> ClientResult<()>;
}

impl ReceivedMessage for SqsEventRecord {
    fn body(&self) -> &str {
        &self.body
    }

    fn receipt_handle(&self) -> &str {
        &self.receipt_handle
    }

    fn has_reserved_attribute(&self) -> bool {
        self.message_attributes.contains_key(RESERVED_ATTRIBUTE_NAME)
    }

    fn restore(&mut self, body: String, receipt_handle: String) {
        self.body = body;
        self.receipt_handle = receipt_handle;
        self.message_attributes.remove(RESERVED_ATTRIBUTE_NAME);
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&general_purpose::STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Bytes>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| {
                general_purpose::STANDARD
                    .decode(encoded)
                    .map(Bytes::from)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
