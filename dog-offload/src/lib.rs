//! # dog-offload: payload offloading to S3-compatible storage
//!
//! `dog-offload` moves payloads that are too large for their carrier (a queue message, an
//! event, a row) into blob storage and hands back a small, stable pointer instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_offload::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> OffloadResult<()> {
//! let client = Arc::new(MemoryBlobClient::new());
//! let dao = BlobDao::new(client).with_encryption(Arc::new(AwsManagedCmk));
//! let store = S3BackedPayloadStore::new("my-bucket", dao);
//!
//! let ctx = CallCtx::new();
//! let pointer = store.store_payload(&ctx, "a very large payload").await?;
//! assert_eq!(store.fetch_payload(&ctx, &pointer).await?, "a very large payload");
//! store.delete_payload(&ctx, &pointer).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ S3BackedPayloadStore │  ← pointers, key generation
//! ├──────────────────────┤
//! │       BlobDao        │  ← decoration, error translation, cancellation
//! ├──────────────────────┤
//! │      BlobClient      │  ← object GET/PUT/DELETE (S3, memory, custom)
//! └──────────────────────┘
//! ```

mod dao;
mod encryption;
mod error;
mod memory;
mod payload;
mod pointer;
mod s3_store;
pub mod store;
mod types;

pub use dao::BlobDao;
pub use encryption::{AwsManagedCmk, CustomerKey, ServerSideEncryptionStrategy};
pub use error::{BoxError, OffloadError, OffloadResult};
pub use memory::{BlobOperation, MemoryBlobClient, MemoryBlobError};
pub use payload::{PayloadStore, S3BackedPayloadStore};
pub use pointer::PayloadPointer;
pub use s3_store::{S3BlobClient, S3CompatibleConfig};
pub use store::{BlobClient, KeyStrategy, PutObjectRequest, UuidKeyStrategy};
pub use types::{ByteStream, CallCtx, CannedAcl, ServerSideEncryption};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AwsManagedCmk, BlobClient, BlobDao, CallCtx, CannedAcl, CustomerKey, MemoryBlobClient,
        OffloadError, OffloadResult, PayloadPointer, PayloadStore, S3BackedPayloadStore,
    };
}
