//! # dog-sqs: SQS with large payloads
//!
//! A drop-in [`QueueService`] that moves message bodies too large for SQS into S3 and
//! sends a small pointer in their place. Receivers get the original body back, and deleting
//! the message removes the stored payload.
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_sqs::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> ClientResult<()> {
//! let blobs = Arc::new(MemoryBlobClient::new());
//! let queue = MemoryQueue::new();
//! let queue_url = queue.create_queue("orders");
//!
//! let config = ExtendedClientConfig::new()
//!     .with_payload_support(blobs.clone(), "large-payloads")
//!     .with_payload_size_threshold(1024);
//! let client = ExtendedClient::new(queue, config);
//!
//! let ctx = CallCtx::new();
//! let body = "x".repeat(4096);
//! client.send_message(&ctx, SendMessageRequest::new(&queue_url, body.clone())).await?;
//! assert_eq!(blobs.len(), 1);
//!
//! let received = client.receive_message(&ctx, ReceiveMessageRequest::new(&queue_url)).await?;
//! let message = &received.messages[0];
//! assert_eq!(message.body, body);
//!
//! client
//!     .delete_message(&ctx, DeleteMessageRequest::new(&queue_url, &message.receipt_handle))
//!     .await?;
//! assert!(blobs.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire compatibility
//!
//! Pointers (`{"s3BucketName":..,"s3Key":..}`), the `ExtendedPayloadSize` attribute and the
//! receipt handle markers match the other SQS extended clients, so producers and consumers
//! written against them interoperate with this crate.

pub mod backend;
mod client;
mod config;
pub mod constants;
mod error;
mod event;
mod handle;
pub mod sizing;
pub mod types;

pub use backend::memory::{MemoryQueue, MemoryQueueError, QueueOperation};
pub use backend::sqs::SqsQueue;
pub use backend::QueueService;
pub use client::ExtendedClient;
pub use config::ExtendedClientConfig;
pub use error::{ClientError, ClientResult};
pub use event::{LambdaEventClient, SqsEvent, SqsEventMessageAttribute, SqsEventRecord};
pub use handle::{MarkerHandleCodec, ReceiptHandleCodec};
pub use types::*;

pub use dog_offload::{
    AwsManagedCmk, BlobClient, CallCtx, CannedAcl, CustomerKey, KeyStrategy, MemoryBlobClient,
    OffloadError, PayloadPointer, S3BlobClient, S3CompatibleConfig, ServerSideEncryptionStrategy,
    UuidKeyStrategy,
};

/// Install a global `fmt` subscriber filtered by `RUST_LOG` (default `info`)
#[cfg(feature = "tracing-basic")]
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CallCtx, ClientError, ClientResult, DeleteMessageRequest, ExtendedClient,
        ExtendedClientConfig, LambdaEventClient, MemoryBlobClient, MemoryQueue, QueueService,
        ReceiveMessageRequest, SendMessageBatchEntry, SendMessageBatchRequest,
        SendMessageRequest, SqsQueue,
    };

    pub use async_trait::async_trait;
}
