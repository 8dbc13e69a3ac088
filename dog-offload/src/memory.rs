use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::{BlobClient, BoxError, ByteStream, PutObjectRequest};

/// Blob operations that can be made to fail on a `MemoryBlobClient`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOperation {
    Put,
    Get,
    Delete,
}

/// Errors reported by the in-memory blob client
#[derive(Error, Debug)]
pub enum MemoryBlobError {
    #[error("The specified key does not exist: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    #[error("Injected failure for {0:?}")]
    Injected(BlobOperation),
}

/// In-memory blob client for development and testing
#[derive(Debug, Default)]
pub struct MemoryBlobClient {
    objects: RwLock<HashMap<(String, String), PutObjectRequest>>,
    failing: HashSet<BlobOperation>,
    unreadable_bodies: bool,
}

impl MemoryBlobClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call of the given operation
    pub fn fail_on(mut self, operation: BlobOperation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Return bodies whose stream errors midway
    pub fn with_unreadable_bodies(mut self) -> Self {
        self.unreadable_bodies = true;
        self
    }

    /// Last write request stored under `bucket`/`key`
    pub fn last_put(&self, bucket: &str, key: &str) -> Option<PutObjectRequest> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Stored text of `bucket`/`key`
    pub fn object(&self, bucket: &str, key: &str) -> Option<String> {
        self.last_put(bucket, key).map(|request| request.body)
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .read()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Keys stored in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn check(&self, operation: BlobOperation) -> Result<(), BoxError> {
        if self.failing.contains(&operation) {
            return Err(Box::new(MemoryBlobError::Injected(operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobClient for MemoryBlobClient {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), BoxError> {
        self.check(BlobOperation::Put)?;
        self.objects
            .write()
            .insert((request.bucket.clone(), request.key.clone()), request);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, BoxError> {
        self.check(BlobOperation::Get)?;
        let body = self.object(bucket, key).ok_or_else(|| MemoryBlobError::NoSuchKey {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        let mut chunks = vec![Ok(Bytes::from(body))];
        if self.unreadable_bodies {
            chunks.push(Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before the body was fully read",
            )));
        }
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BoxError> {
        self.check(BlobOperation::Delete)?;
        self.objects
            .write()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
