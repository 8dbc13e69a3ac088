use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{OffloadError, OffloadResult};

/// Reference to an offloaded payload: the bucket and object key it was written to.
///
/// The JSON form is the message body that travels through the queue, so the field
/// names and their order are part of the wire format:
///
/// ```text
/// {"s3BucketName":"<bucket>","s3Key":"<key>"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadPointer {
    #[serde(rename = "s3BucketName")]
    pub bucket_name: String,

    #[serde(rename = "s3Key")]
    pub key: String,
}

impl PayloadPointer {
    pub fn new<B: Into<String>, K: Into<String>>(bucket_name: B, key: K) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            key: key.into(),
        }
    }

    /// Parse a pointer from its JSON form
    pub fn from_json(json: &str) -> OffloadResult<Self> {
        serde_json::from_str(json).map_err(|e| OffloadError::pointer_format(json, e))
    }

    /// Serialize to the compact JSON form
    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PayloadPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromStr for PayloadPointer {
    type Err = OffloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}
