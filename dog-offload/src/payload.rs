use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::{BlobDao, CallCtx, KeyStrategy, OffloadResult, PayloadPointer, UuidKeyStrategy};

/// A store with a higher payload size limit than the queue it backs.
///
/// Pointers are the JSON form of [`PayloadPointer`]; only pointers returned by
/// `store_payload` are meaningful to `fetch_payload` and `delete_payload`.
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Store a payload under a generated key and return its pointer
    async fn store_payload(&self, ctx: &CallCtx, payload: &str) -> OffloadResult<String>;

    /// Store a payload under `key` and return its pointer
    async fn store_payload_with_key(
        &self,
        ctx: &CallCtx,
        payload: &str,
        key: &str,
    ) -> OffloadResult<String>;

    /// Read back the payload a pointer refers to
    async fn fetch_payload(&self, ctx: &CallCtx, pointer: &str) -> OffloadResult<String>;

    /// Delete the payload a pointer refers to
    async fn delete_payload(&self, ctx: &CallCtx, pointer: &str) -> OffloadResult<()>;
}

/// Payload store writing one S3 object per payload into a fixed bucket
#[derive(Clone)]
pub struct S3BackedPayloadStore {
    bucket_name: String,
    dao: BlobDao,
    keys: Arc<dyn KeyStrategy>,
}

impl S3BackedPayloadStore {
    pub fn new<S: Into<String>>(bucket_name: S, dao: BlobDao) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            dao,
            keys: Arc::new(UuidKeyStrategy),
        }
    }

    /// Replace the key generation strategy
    pub fn with_key_strategy(mut self, keys: Arc<dyn KeyStrategy>) -> Self {
        self.keys = keys;
        self
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl PayloadStore for S3BackedPayloadStore {
    async fn store_payload(&self, ctx: &CallCtx, payload: &str) -> OffloadResult<String> {
        let key = self.keys.generate_key();
        self.store_payload_with_key(ctx, payload, &key).await
    }

    async fn store_payload_with_key(
        &self,
        ctx: &CallCtx,
        payload: &str,
        key: &str,
    ) -> OffloadResult<String> {
        self.dao.store_text(ctx, &self.bucket_name, key, payload).await?;
        info!(bucket = %self.bucket_name, key, "S3 object created");
        Ok(PayloadPointer::new(self.bucket_name.as_str(), key).to_json())
    }

    async fn fetch_payload(&self, ctx: &CallCtx, pointer: &str) -> OffloadResult<String> {
        let PayloadPointer { bucket_name, key } = PayloadPointer::from_json(pointer)?;
        let payload = self.dao.get_text(ctx, &bucket_name, &key).await?;
        info!(bucket = %bucket_name, key = %key, "S3 object read");
        Ok(payload)
    }

    async fn delete_payload(&self, ctx: &CallCtx, pointer: &str) -> OffloadResult<()> {
        let PayloadPointer { bucket_name, key } = PayloadPointer::from_json(pointer)?;
        self.dao.delete(ctx, &bucket_name, &key).await?;
        info!(bucket = %bucket_name, key = %key, "S3 object deleted");
        Ok(())
    }
}
