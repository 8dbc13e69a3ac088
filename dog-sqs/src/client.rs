//! The extended client: a [`QueueService`] decorator that offloads large payloads.

use async_trait::async_trait;
use dog_offload::{BlobDao, PayloadPointer, PayloadStore, S3BackedPayloadStore};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::backend::QueueService;
use crate::constants::{MAX_ALLOWED_ATTRIBUTES, RESERVED_ATTRIBUTE_NAME};
use crate::event::{LambdaEventClient, SqsEvent};
use crate::handle::{MarkerHandleCodec, ReceiptHandleCodec};
use crate::sizing::{attributes_size, byte_size, OffloadCandidate};
use crate::types::{
    ChangeMessageVisibilityBatchRequest, ChangeMessageVisibilityBatchResponse,
    ChangeMessageVisibilityRequest, DeleteMessageBatchRequest, DeleteMessageBatchResponse,
    DeleteMessageRequest, Message, MessageAttributeValue, MessageAttributes,
    ReceiveMessageRequest, ReceiveMessageResponse, SendMessageBatchRequest,
    SendMessageBatchResponse, SendMessageRequest, SendMessageResponse,
};
use crate::{CallCtx, ClientError, ClientResult, ExtendedClientConfig};

/// A received message whose body may be a payload pointer
pub(crate) trait ReceivedMessage: Send {
    fn body(&self) -> &str;
    fn receipt_handle(&self) -> &str;
    fn has_reserved_attribute(&self) -> bool;

    /// Replace body and handle and drop the reserved attribute
    fn restore(&mut self, body: String, receipt_handle: String);
}

impl ReceivedMessage for Message {
    fn body(&self) -> &str {
        &self.body
    }

    fn receipt_handle(&self) -> &str {
        &self.receipt_handle
    }

    fn has_reserved_attribute(&self) -> bool {
        self.message_attributes.contains_key(RESERVED_ATTRIBUTE_NAME)
    }

    fn restore(&mut self, body: String, receipt_handle: String) {
        self.body = body;
        self.receipt_handle = receipt_handle;
        self.message_attributes.remove(RESERVED_ATTRIBUTE_NAME);
    }
}

/// Queue client that moves message bodies larger than the configured threshold to S3.
///
/// Wraps any [`QueueService`] and is one itself. With offloading disabled every call is
/// forwarded unchanged, so it can replace the wrapped client anywhere.
///
/// - **send**: validates attributes, then stores large bodies (or every body when
///   `always_through_s3` is set) and sends a pointer plus the `ExtendedPayloadSize` attribute
/// - **receive**: fetches the payload of every pointer message and returns an augmented
///   receipt handle that locates it
/// - **delete**: removes the payload when cleanup is enabled and deletes with the
///   original handle
/// - **visibility change**: always forwards the original handle
pub struct ExtendedClient<Q> {
    sqs: Q,
    config: ExtendedClientConfig,
    payload_store: Option<Arc<dyn PayloadStore>>,
    handle_codec: Arc<dyn ReceiptHandleCodec>,
}

impl<Q: QueueService> ExtendedClient<Q> {
    pub fn new(sqs: Q, config: ExtendedClientConfig) -> Self {
        let payload_store = build_payload_store(&config);

        Self {
            sqs,
            config,
            payload_store,
            handle_codec: Arc::new(MarkerHandleCodec::new()),
        }
    }

    /// Replace the receipt handle codec
    pub fn with_handle_codec(mut self, codec: Arc<dyn ReceiptHandleCodec>) -> Self {
        self.handle_codec = codec;
        self
    }

    pub fn config(&self) -> &ExtendedClientConfig {
        &self.config
    }

    /// The wrapped queue service
    pub fn inner(&self) -> &Q {
        &self.sqs
    }

    pub fn into_inner(self) -> Q {
        self.sqs
    }

    pub fn is_payload_support_enabled(&self) -> bool {
        self.payload_store.is_some()
    }

    fn validate_body(body: &str) -> ClientResult<()> {
        if body.is_empty() {
            return Err(rejected("messageBody cannot be null or empty".to_string()));
        }
        Ok(())
    }

    fn validate_attributes(&self, attributes: &MessageAttributes) -> ClientResult<()> {
        let threshold = self.config.payload_size_threshold;
        let size = attributes_size(attributes);
        if size > threshold {
            return Err(rejected(format!(
                "Total size of Message attributes is {size} bytes which is larger than the \
                 threshold of {threshold} Bytes. Consider including the payload in the message \
                 body instead of message attributes."
            )));
        }

        if attributes.len() > MAX_ALLOWED_ATTRIBUTES {
            return Err(rejected(format!(
                "Number of message attributes [{}] exceeds the maximum allowed for large-payload \
                 messages [{MAX_ALLOWED_ATTRIBUTES}].",
                attributes.len()
            )));
        }

        if attributes.contains_key(RESERVED_ATTRIBUTE_NAME) {
            return Err(rejected(format!(
                "Message attribute name {RESERVED_ATTRIBUTE_NAME} is reserved for use by SQS \
                 extended client."
            )));
        }

        Ok(())
    }

    fn validate<M: OffloadCandidate>(&self, message: &M) -> ClientResult<()> {
        Self::validate_body(message.message_body())?;
        self.validate_attributes(message.message_attributes())
    }

    /// Store the body and replace it with a pointer if the message needs offloading
    async fn offload<M: OffloadCandidate>(
        &self,
        ctx: &CallCtx,
        store: &dyn PayloadStore,
        mut message: M,
    ) -> ClientResult<M> {
        if !self.config.always_through_s3 && !message.is_large(self.config.payload_size_threshold) {
            return Ok(message);
        }

        let size = byte_size(Some(message.message_body()));
        let pointer = store.store_payload(ctx, message.message_body()).await?;
        message
            .message_attributes_mut()
            .insert(RESERVED_ATTRIBUTE_NAME.to_string(), MessageAttributeValue::number(size));
        message.set_message_body(pointer);

        debug!(size, "Message payload offloaded");
        Ok(message)
    }

    async fn rehydrate<M: ReceivedMessage>(
        &self,
        ctx: &CallCtx,
        store: &dyn PayloadStore,
        message: &mut M,
    ) -> ClientResult<()> {
        if !message.has_reserved_attribute() {
            return Ok(());
        }

        let pointer = PayloadPointer::from_json(message.body())?;
        let payload = store.fetch_payload(ctx, message.body()).await?;
        let handle = self.handle_codec.embed(&pointer, message.receipt_handle())?;

        debug!(
            bucket = %pointer.bucket_name,
            key = %pointer.key,
            size = payload.len(),
            "Message payload restored"
        );
        message.restore(payload, handle);
        Ok(())
    }

    /// Rehydrate every message concurrently; any failure fails the whole set
    async fn rehydrate_all<M: ReceivedMessage>(
        &self,
        ctx: &CallCtx,
        store: &dyn PayloadStore,
        messages: &mut [M],
    ) -> ClientResult<()> {
        join_all(
            messages
                .iter_mut()
                .map(|message| self.rehydrate(ctx, store, message)),
        )
        .await
        .into_iter()
        .collect()
    }

    /// Delete the payload behind an augmented handle when cleanup is on, and return
    /// the handle the queue issued
    async fn release_handle(
        &self,
        ctx: &CallCtx,
        store: &dyn PayloadStore,
        handle: &str,
    ) -> ClientResult<String> {
        if self.config.cleanup_payload && self.handle_codec.is_augmented(handle) {
            let pointer = self.handle_codec.recover_pointer(handle)?;
            store.delete_payload(ctx, &pointer.to_json()).await?;
        }
        Ok(self.handle_codec.original_handle(handle))
    }
}

fn rejected(message: String) -> ClientError {
    error!("{message}");
    ClientError::validation(message)
}

fn build_payload_store(config: &ExtendedClientConfig) -> Option<Arc<dyn PayloadStore>> {
    let client = config.blob_client()?;
    let bucket = config.bucket_name()?;

    let mut dao = BlobDao::new(Arc::clone(client));
    if let Some(strategy) = &config.encryption {
        dao = dao.with_encryption(Arc::clone(strategy));
    }
    if let Some(acl) = config.canned_acl {
        dao = dao.with_canned_acl(acl);
    }

    let mut store = S3BackedPayloadStore::new(bucket, dao);
    if let Some(keys) = &config.key_strategy {
        store = store.with_key_strategy(Arc::clone(keys));
    }
    Some(Arc::new(store))
}

#[async_trait]
impl<Q: QueueService> QueueService for ExtendedClient<Q> {
    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url))]
    async fn send_message(
        &self,
        ctx: &CallCtx,
        request: SendMessageRequest,
    ) -> ClientResult<SendMessageResponse> {
        let Some(store) = self.payload_store.as_deref() else {
            return self.sqs.send_message(ctx, request).await;
        };

        self.validate(&request)?;
        let request = self.offload(ctx, store, request).await?;
        self.sqs.send_message(ctx, request).await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url, entries = request.entries.len()))]
    async fn send_message_batch(
        &self,
        ctx: &CallCtx,
        request: SendMessageBatchRequest,
    ) -> ClientResult<SendMessageBatchResponse> {
        let Some(store) = self.payload_store.as_deref() else {
            return self.sqs.send_message_batch(ctx, request).await;
        };

        for entry in &request.entries {
            self.validate(entry)?;
        }

        let SendMessageBatchRequest { queue_url, entries } = request;
        let entries = join_all(
            entries
                .into_iter()
                .map(|entry| self.offload(ctx, store, entry)),
        )
        .await
        .into_iter()
        .collect::<ClientResult<Vec<_>>>()?;

        self.sqs
            .send_message_batch(ctx, SendMessageBatchRequest { queue_url, entries })
            .await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url))]
    async fn receive_message(
        &self,
        ctx: &CallCtx,
        mut request: ReceiveMessageRequest,
    ) -> ClientResult<ReceiveMessageResponse> {
        let Some(store) = self.payload_store.as_deref() else {
            return self.sqs.receive_message(ctx, request).await;
        };

        request
            .message_attribute_names
            .retain(|name| name != RESERVED_ATTRIBUTE_NAME);
        request
            .message_attribute_names
            .push(RESERVED_ATTRIBUTE_NAME.to_string());

        let mut response = self.sqs.receive_message(ctx, request).await?;
        self.rehydrate_all(ctx, store, &mut response.messages).await?;
        Ok(response)
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url))]
    async fn delete_message(
        &self,
        ctx: &CallCtx,
        mut request: DeleteMessageRequest,
    ) -> ClientResult<()> {
        let Some(store) = self.payload_store.as_deref() else {
            return self.sqs.delete_message(ctx, request).await;
        };

        request.receipt_handle = self
            .release_handle(ctx, store, &request.receipt_handle)
            .await?;
        self.sqs.delete_message(ctx, request).await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url, entries = request.entries.len()))]
    async fn delete_message_batch(
        &self,
        ctx: &CallCtx,
        mut request: DeleteMessageBatchRequest,
    ) -> ClientResult<DeleteMessageBatchResponse> {
        let Some(store) = self.payload_store.as_deref() else {
            return self.sqs.delete_message_batch(ctx, request).await;
        };

        let handles = join_all(
            request
                .entries
                .iter()
                .map(|entry| self.release_handle(ctx, store, &entry.receipt_handle)),
        )
        .await
        .into_iter()
        .collect::<ClientResult<Vec<_>>>()?;

        for (entry, handle) in request.entries.iter_mut().zip(handles) {
            entry.receipt_handle = handle;
        }
        self.sqs.delete_message_batch(ctx, request).await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url))]
    async fn change_message_visibility(
        &self,
        ctx: &CallCtx,
        mut request: ChangeMessageVisibilityRequest,
    ) -> ClientResult<()> {
        request.receipt_handle = self.handle_codec.original_handle(&request.receipt_handle);
        self.sqs.change_message_visibility(ctx, request).await
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id, queue_url = %request.queue_url, entries = request.entries.len()))]
    async fn change_message_visibility_batch(
        &self,
        ctx: &CallCtx,
        mut request: ChangeMessageVisibilityBatchRequest,
    ) -> ClientResult<ChangeMessageVisibilityBatchResponse> {
        for entry in &mut request.entries {
            entry.receipt_handle = self.handle_codec.original_handle(&entry.receipt_handle);
        }
        self.sqs.change_message_visibility_batch(ctx, request).await
    }

    async fn get_queue_url(&self, ctx: &CallCtx, queue_name: &str) -> ClientResult<String> {
        self.sqs.get_queue_url(ctx, queue_name).await
    }

    async fn get_queue_attributes(
        &self,
        ctx: &CallCtx,
        queue_url: &str,
        attribute_names: &[String],
    ) -> ClientResult<HashMap<String, String>> {
        self.sqs
            .get_queue_attributes(ctx, queue_url, attribute_names)
            .await
    }

    async fn purge_queue(&self, ctx: &CallCtx, queue_url: &str) -> ClientResult<()> {
        self.sqs.purge_queue(ctx, queue_url).await
    }
}

#[async_trait]
impl<Q: QueueService> LambdaEventClient for ExtendedClient<Q> {
    #[instrument(skip_all, fields(request_id = %ctx.request_id, records = event.records.len()))]
    async fn fetch_payloads(&self, ctx: &CallCtx, event: &mut SqsEvent) -> ClientResult<()> {
        let Some(store) = self.payload_store.as_deref() else {
            return Ok(());
        };

        self.rehydrate_all(ctx, store, &mut event.records).await
    }
}
