pub mod memory;
pub mod sqs;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::{
    ChangeMessageVisibilityBatchRequest, ChangeMessageVisibilityBatchResponse,
    ChangeMessageVisibilityRequest, DeleteMessageBatchRequest, DeleteMessageBatchResponse,
    DeleteMessageRequest, ReceiveMessageRequest, ReceiveMessageResponse, SendMessageBatchRequest,
    SendMessageBatchResponse, SendMessageRequest, SendMessageResponse,
};
use crate::{CallCtx, ClientResult};

/// The native queue-service contract.
///
/// Implemented by the raw queue clients and by `ExtendedClient`, which wraps one and
/// can be used anywhere the raw client is.
#[async_trait]
pub trait QueueService: Send + Sync {
    async fn send_message(
        &self,
        ctx: &CallCtx,
        request: SendMessageRequest,
    ) -> ClientResult<SendMessageResponse>;

    async fn send_message_batch(
        &self,
        ctx: &CallCtx,
        request: SendMessageBatchRequest,
    ) -> ClientResult<SendMessageBatchResponse>;

    async fn receive_message(
        &self,
        ctx: &CallCtx,
        request: ReceiveMessageRequest,
    ) -> ClientResult<ReceiveMessageResponse>;

    async fn delete_message(&self, ctx: &CallCtx, request: DeleteMessageRequest) -> ClientResult<()>;

    async fn delete_message_batch(
        &self,
        ctx: &CallCtx,
        request: DeleteMessageBatchRequest,
    ) -> ClientResult<DeleteMessageBatchResponse>;

    async fn change_message_visibility(
        &self,
        ctx: &CallCtx,
        request: ChangeMessageVisibilityRequest,
    ) -> ClientResult<()>;

    async fn change_message_visibility_batch(
        &self,
        ctx: &CallCtx,
        request: ChangeMessageVisibilityBatchRequest,
    ) -> ClientResult<ChangeMessageVisibilityBatchResponse>;

    /// Resolve a queue name to its URL
    async fn get_queue_url(&self, ctx: &CallCtx, queue_name: &str) -> ClientResult<String>;

    /// Read queue attributes (`ApproximateNumberOfMessages`, `VisibilityTimeout`, ...)
    async fn get_queue_attributes(
        &self,
        ctx: &CallCtx,
        queue_url: &str,
        attribute_names: &[String],
    ) -> ClientResult<HashMap<String, String>>;

    /// Delete every message in the queue
    async fn purge_queue(&self, ctx: &CallCtx, queue_url: &str) -> ClientResult<()>;
}
