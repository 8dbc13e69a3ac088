use async_trait::async_trait;
use uuid::Uuid;

use crate::{BoxError, ByteStream, CannedAcl, ServerSideEncryption};

/// Object storage primitives - must be implemented by all blob backends.
///
/// Errors are returned untranslated; `BlobDao` attaches the bucket/key context.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// Write an object
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), BoxError>;

    /// Open an object for reading
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, BoxError>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BoxError>;
}

/// Outgoing write request, open to decoration before it is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: String,
    pub server_side_encryption: Option<ServerSideEncryption>,
    pub sse_kms_key_id: Option<String>,
    pub canned_acl: Option<CannedAcl>,
}

impl PutObjectRequest {
    pub fn new<B: Into<String>, K: Into<String>, P: Into<String>>(bucket: B, key: K, body: P) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            body: body.into(),
            server_side_encryption: None,
            sse_kms_key_id: None,
            canned_acl: None,
        }
    }

    pub fn with_canned_acl(mut self, acl: CannedAcl) -> Self {
        self.canned_acl = Some(acl);
        self
    }
}

/// Strategy for generating object keys for new payloads
pub trait KeyStrategy: Send + Sync {
    /// Generate a new unique key name
    fn generate_key(&self) -> String;
}

/// Default key strategy: a random v4 UUID
#[derive(Debug, Clone, Default)]
pub struct UuidKeyStrategy;

impl KeyStrategy for UuidKeyStrategy {
    fn generate_key(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
