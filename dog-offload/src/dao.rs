use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    BlobClient, CallCtx, CannedAcl, OffloadError, OffloadResult, PutObjectRequest,
    ServerSideEncryptionStrategy,
};

/// Text-oriented GET/PUT/DELETE over a `BlobClient` with uniform error translation
#[derive(Clone)]
pub struct BlobDao {
    client: Arc<dyn BlobClient>,
    encryption: Option<Arc<dyn ServerSideEncryptionStrategy>>,
    canned_acl: Option<CannedAcl>,
}

impl BlobDao {
    pub fn new(client: Arc<dyn BlobClient>) -> Self {
        Self {
            client,
            encryption: None,
            canned_acl: None,
        }
    }

    /// Encrypt every stored object with this strategy
    pub fn with_encryption(mut self, strategy: Arc<dyn ServerSideEncryptionStrategy>) -> Self {
        self.encryption = Some(strategy);
        self
    }

    /// Attach this canned ACL to every stored object
    pub fn with_canned_acl(mut self, acl: CannedAcl) -> Self {
        self.canned_acl = Some(acl);
        self
    }

    /// Build the decorated write request for a payload
    pub fn put_request(&self, bucket: &str, key: &str, payload: &str) -> PutObjectRequest {
        let mut request = PutObjectRequest::new(bucket, key, payload);
        if let Some(acl) = self.canned_acl {
            request = request.with_canned_acl(acl);
        }
        if let Some(strategy) = &self.encryption {
            strategy.decorate(&mut request);
        }
        request
    }

    pub async fn store_text(
        &self,
        ctx: &CallCtx,
        bucket: &str,
        key: &str,
        payload: &str,
    ) -> OffloadResult<()> {
        let request = self.put_request(bucket, key, payload);

        match ctx.until_cancelled(self.client.put_object(request)).await {
            Some(Ok(())) => Ok(()),
            Some(Err(source)) => {
                let err = OffloadError::store_failure(bucket, key, source);
                error!(bucket, key, error = %err, "failed to store payload object");
                Err(err)
            }
            None => Err(OffloadError::cancelled("store_text")),
        }
    }

    pub async fn get_text(&self, ctx: &CallCtx, bucket: &str, key: &str) -> OffloadResult<String> {
        let mut stream = match ctx.until_cancelled(self.client.get_object(bucket, key)).await {
            Some(Ok(stream)) => stream,
            Some(Err(source)) => {
                let err = OffloadError::fetch_failure(bucket, key, source);
                error!(bucket, key, error = %err, "failed to get payload object");
                return Err(err);
            }
            None => return Err(OffloadError::cancelled("get_text")),
        };

        let mut data = Vec::new();
        loop {
            let chunk = match ctx.until_cancelled(stream.next()).await {
                Some(Some(chunk)) => chunk,
                Some(None) => break,
                None => return Err(OffloadError::cancelled("get_text")),
            };
            match chunk {
                Ok(bytes) => data.extend_from_slice(&bytes),
                Err(source) => {
                    let err = OffloadError::read_failure(bucket, key, source);
                    error!(bucket, key, error = %err, "failed to read payload object");
                    return Err(err);
                }
            }
        }

        debug!(bucket, key, size = data.len(), "payload object read");
        String::from_utf8(data).map_err(|source| {
            let err = OffloadError::read_failure(bucket, key, source);
            error!(bucket, key, error = %err, "payload object is not valid UTF-8");
            err
        })
    }

    pub async fn delete(&self, ctx: &CallCtx, bucket: &str, key: &str) -> OffloadResult<()> {
        match ctx.until_cancelled(self.client.delete_object(bucket, key)).await {
            Some(Ok(())) => Ok(()),
            Some(Err(source)) => {
                let err = OffloadError::delete_failure(bucket, key, source);
                error!(bucket, key, error = %err, "failed to delete payload object");
                Err(err)
            }
            None => Err(OffloadError::cancelled("delete")),
        }
    }
}
