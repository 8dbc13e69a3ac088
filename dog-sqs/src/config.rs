use dog_offload::{BlobClient, CannedAcl, KeyStrategy, ServerSideEncryptionStrategy};
use std::fmt;
use std::sync::Arc;

use crate::constants::DEFAULT_MESSAGE_SIZE_THRESHOLD;
use crate::{ClientError, ClientResult};

/// Configuration for the extended client.
///
/// Built once and moved into the client; the client only reads it afterwards.
#[derive(Clone)]
pub struct ExtendedClientConfig {
    blob_client: Option<Arc<dyn BlobClient>>,
    bucket_name: Option<String>,

    /// Delete the offloaded object when its message is deleted
    pub cleanup_payload: bool,

    /// Bodies plus attributes larger than this many bytes are offloaded
    pub payload_size_threshold: usize,

    /// Offload every message regardless of size
    pub always_through_s3: bool,

    pub encryption: Option<Arc<dyn ServerSideEncryptionStrategy>>,
    pub canned_acl: Option<CannedAcl>,
    pub key_strategy: Option<Arc<dyn KeyStrategy>>,
}

impl Default for ExtendedClientConfig {
    fn default() -> Self {
        Self {
            blob_client: None,
            bucket_name: None,
            cleanup_payload: false,
            payload_size_threshold: DEFAULT_MESSAGE_SIZE_THRESHOLD,
            always_through_s3: false,
            encryption: None,
            canned_acl: None,
            key_strategy: None,
        }
    }
}

impl fmt::Debug for ExtendedClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedClientConfig")
            .field("bucket_name", &self.bucket_name)
            .field("payload_support", &self.is_payload_support_enabled())
            .field("cleanup_payload", &self.cleanup_payload)
            .field("payload_size_threshold", &self.payload_size_threshold)
            .field("always_through_s3", &self.always_through_s3)
            .field("encryption", &self.encryption.is_some())
            .field("canned_acl", &self.canned_acl)
            .finish()
    }
}

impl ExtendedClientConfig {
    /// Create a config with offloading disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable offloading into `bucket_name`; also enables payload cleanup on delete
    pub fn with_payload_support<S: Into<String>>(
        mut self,
        blob_client: Arc<dyn BlobClient>,
        bucket_name: S,
    ) -> Self {
        self.blob_client = Some(blob_client);
        self.bucket_name = Some(bucket_name.into());
        self.cleanup_payload = true;
        self
    }

    pub fn with_payload_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup_payload = cleanup;
        self
    }

    pub fn with_payload_size_threshold(mut self, bytes: usize) -> Self {
        self.payload_size_threshold = bytes;
        self
    }

    pub fn with_always_through_s3(mut self, always: bool) -> Self {
        self.always_through_s3 = always;
        self
    }

    pub fn with_encryption(mut self, strategy: Arc<dyn ServerSideEncryptionStrategy>) -> Self {
        self.encryption = Some(strategy);
        self
    }

    pub fn with_canned_acl(mut self, acl: CannedAcl) -> Self {
        self.canned_acl = Some(acl);
        self
    }

    pub fn with_key_strategy(mut self, strategy: Arc<dyn KeyStrategy>) -> Self {
        self.key_strategy = Some(strategy);
        self
    }

    /// Apply `{prefix}PAYLOAD_SIZE_THRESHOLD`, `{prefix}ALWAYS_THROUGH_S3` and
    /// `{prefix}CLEANUP_PAYLOAD` from the process environment
    pub fn with_env_overrides(self, prefix: &str) -> ClientResult<Self> {
        self.with_overrides_from(prefix, |name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`; unset variables leave the value unchanged
    pub fn with_overrides_from<F>(mut self, prefix: &str, lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let threshold_var = format!("{prefix}PAYLOAD_SIZE_THRESHOLD");
        if let Some(value) = lookup(&threshold_var) {
            self.payload_size_threshold = value.trim().parse().map_err(|_| {
                ClientError::validation(format!(
                    "{threshold_var} must be a byte count, got {value:?}"
                ))
            })?;
        }

        let always_var = format!("{prefix}ALWAYS_THROUGH_S3");
        if let Some(value) = lookup(&always_var) {
            self.always_through_s3 = parse_flag(&always_var, &value)?;
        }

        let cleanup_var = format!("{prefix}CLEANUP_PAYLOAD");
        if let Some(value) = lookup(&cleanup_var) {
            self.cleanup_payload = parse_flag(&cleanup_var, &value)?;
        }

        Ok(self)
    }

    /// True iff both a blob client and a bucket are configured
    pub fn is_payload_support_enabled(&self) -> bool {
        self.blob_client.is_some() && self.bucket_name.is_some()
    }

    pub fn blob_client(&self) -> Option<&Arc<dyn BlobClient>> {
        self.blob_client.as_ref()
    }

    pub fn bucket_name(&self) -> Option<&str> {
        self.bucket_name.as_deref()
    }
}

fn parse_flag(name: &str, value: &str) -> ClientResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ClientError::validation(format!(
            "{name} must be a boolean, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dog_offload::MemoryBlobClient;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExtendedClientConfig::new();
        assert!(!config.is_payload_support_enabled());
        assert!(!config.cleanup_payload);
        assert!(!config.always_through_s3);
        assert_eq!(config.payload_size_threshold, 262_144);
    }

    #[test]
    fn test_payload_support_enables_cleanup() {
        let config = ExtendedClientConfig::new()
            .with_payload_support(Arc::new(MemoryBlobClient::new()), "bucket");
        assert!(config.is_payload_support_enabled());
        assert!(config.cleanup_payload);
        assert_eq!(config.bucket_name(), Some("bucket"));

        let config = config.with_payload_cleanup(false);
        assert!(!config.cleanup_payload);
    }

    #[test]
    fn test_overrides() {
        let config = ExtendedClientConfig::new()
            .with_overrides_from(
                "APP_",
                lookup(&[
                    ("APP_PAYLOAD_SIZE_THRESHOLD", "1024"),
                    ("APP_ALWAYS_THROUGH_S3", "true"),
                    ("APP_CLEANUP_PAYLOAD", "0"),
                ]),
            )
            .unwrap();

        assert_eq!(config.payload_size_threshold, 1024);
        assert!(config.always_through_s3);
        assert!(!config.cleanup_payload);
    }

    #[test]
    fn test_unset_overrides_keep_values() {
        let config = ExtendedClientConfig::new()
            .with_payload_size_threshold(10)
            .with_overrides_from("APP_", lookup(&[]))
            .unwrap();
        assert_eq!(config.payload_size_threshold, 10);
    }

    #[test]
    fn test_invalid_override_is_validation_error() {
        let err = ExtendedClientConfig::new()
            .with_overrides_from("APP_", lookup(&[("APP_PAYLOAD_SIZE_THRESHOLD", "big")]))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("APP_PAYLOAD_SIZE_THRESHOLD"));

        let err = ExtendedClientConfig::new()
            .with_overrides_from("APP_", lookup(&[("APP_ALWAYS_THROUGH_S3", "maybe")]))
            .unwrap_err();
        assert!(err.is_validation());
    }
}
