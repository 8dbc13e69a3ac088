use crate::{PutObjectRequest, ServerSideEncryption};

/// Decorates outgoing writes with server-side encryption settings
pub trait ServerSideEncryptionStrategy: Send + Sync {
    fn decorate(&self, request: &mut PutObjectRequest);
}

/// Encrypt with the provider-managed KMS key
#[derive(Debug, Clone, Default)]
pub struct AwsManagedCmk;

impl ServerSideEncryptionStrategy for AwsManagedCmk {
    fn decorate(&self, request: &mut PutObjectRequest) {
        request.server_side_encryption = Some(ServerSideEncryption::AwsKms);
    }
}

/// Encrypt with a customer-managed KMS key
#[derive(Debug, Clone)]
pub struct CustomerKey {
    kms_key_id: String,
}

impl CustomerKey {
    pub fn new<S: Into<String>>(kms_key_id: S) -> Self {
        Self {
            kms_key_id: kms_key_id.into(),
        }
    }

    pub fn kms_key_id(&self) -> &str {
        &self.kms_key_id
    }
}

impl ServerSideEncryptionStrategy for CustomerKey {
    fn decorate(&self, request: &mut PutObjectRequest) {
        request.server_side_encryption = Some(ServerSideEncryption::AwsKms);
        request.sse_kms_key_id = Some(self.kms_key_id.clone());
    }
}
