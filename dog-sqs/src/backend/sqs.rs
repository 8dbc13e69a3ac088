use async_trait::async_trait;
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types as sdk;
use aws_sdk_sqs::Client;
use bytes::Bytes;
use std::collections::HashMap;

use super::QueueService;
use crate::types::{
    BatchResultError, ChangeMessageVisibilityBatchRequest, ChangeMessageVisibilityBatchResponse,
    ChangeMessageVisibilityRequest, DeleteMessageBatchRequest, DeleteMessageBatchResponse,
    DeleteMessageRequest, Message, MessageAttributeValue, MessageAttributes,
    ReceiveMessageRequest, ReceiveMessageResponse, SendMessageBatchRequest,
    SendMessageBatchResponse, SendMessageBatchResultEntry, SendMessageRequest,
    SendMessageResponse,
};
use crate::{CallCtx, ClientError, ClientResult};

/// Queue service backed by Amazon SQS
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
}

impl SqsQueue {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS configuration chain
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn to_sdk_attributes(
    operation: &'static str,
    attributes: MessageAttributes,
) -> ClientResult<Option<HashMap<String, sdk::MessageAttributeValue>>> {
    if attributes.is_empty() {
        return Ok(None);
    }

    attributes
        .into_iter()
        .map(|(name, value)| {
            let value = sdk::MessageAttributeValue::builder()
                .data_type(value.data_type)
                .set_string_value(value.string_value)
                .set_binary_value(value.binary_value.map(|b| Blob::new(b.to_vec())))
                .build()
                .map_err(|e| ClientError::queue(operation, e))?;
            Ok((name, value))
        })
        .collect::<ClientResult<HashMap<_, _>>>()
        .map(Some)
}

fn from_sdk_attributes(
    attributes: Option<HashMap<String, sdk::MessageAttributeValue>>,
) -> MessageAttributes {
    attributes
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let converted = MessageAttributeValue {
                data_type: value.data_type().to_string(),
                string_value: value.string_value().map(str::to_string),
                binary_value: value
                    .binary_value()
                    .map(|b| Bytes::copy_from_slice(b.as_ref())),
            };
            (name, converted)
        })
        .collect()
}

fn from_sdk_message(message: sdk::Message) -> Message {
    Message {
        message_id: message.message_id,
        receipt_handle: message.receipt_handle.unwrap_or_default(),
        body: message.body.unwrap_or_default(),
        md5_of_body: message.md5_of_body,
        attributes: message
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect(),
        message_attributes: from_sdk_attributes(message.message_attributes),
    }
}

fn from_sdk_batch_error(entry: &sdk::BatchResultErrorEntry) -> BatchResultError {
    BatchResultError {
        id: entry.id().to_string(),
        code: entry.code().to_string(),
        message: entry.message().map(str::to_string),
        sender_fault: entry.sender_fault(),
    }
}

#[async_trait]
impl QueueService for SqsQueue {
    async fn send_message(
        &self,
        ctx: &CallCtx,
        request: SendMessageRequest,
    ) -> ClientResult<SendMessageResponse> {
        let call = self
            .client
            .send_message()
            .queue_url(request.queue_url)
            .message_body(request.message_body)
            .set_message_attributes(to_sdk_attributes("send_message", request.message_attributes)?)
            .set_delay_seconds(request.delay_seconds)
            .set_message_group_id(request.message_group_id)
            .set_message_deduplication_id(request.message_deduplication_id)
            .send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("send_message"))?
            .map_err(|e| ClientError::queue("send_message", e))?;

        Ok(SendMessageResponse {
            message_id: output.message_id,
            md5_of_message_body: output.md5_of_message_body,
            sequence_number: output.sequence_number,
        })
    }

    async fn send_message_batch(
        &self,
        ctx: &CallCtx,
        request: SendMessageBatchRequest,
    ) -> ClientResult<SendMessageBatchResponse> {
        let entries = request
            .entries
            .into_iter()
            .map(|entry| {
                sdk::SendMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .message_body(entry.message_body)
                    .set_message_attributes(to_sdk_attributes(
                        "send_message_batch",
                        entry.message_attributes,
                    )?)
                    .set_delay_seconds(entry.delay_seconds)
                    .set_message_group_id(entry.message_group_id)
                    .set_message_deduplication_id(entry.message_deduplication_id)
                    .build()
                    .map_err(|e| ClientError::queue("send_message_batch", e))
            })
            .collect::<ClientResult<Vec<_>>>()?;

        let call = self
            .client
            .send_message_batch()
            .queue_url(request.queue_url)
            .set_entries(Some(entries))
            .send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("send_message_batch"))?
            .map_err(|e| ClientError::queue("send_message_batch", e))?;

        Ok(SendMessageBatchResponse {
            successful: output
                .successful()
                .iter()
                .map(|entry| SendMessageBatchResultEntry {
                    id: entry.id().to_string(),
                    message_id: entry.message_id().to_string(),
                    md5_of_message_body: entry.md5_of_message_body().to_string(),
                    sequence_number: entry.sequence_number().map(str::to_string),
                })
                .collect(),
            failed: output.failed().iter().map(from_sdk_batch_error).collect(),
        })
    }

    async fn receive_message(
        &self,
        ctx: &CallCtx,
        request: ReceiveMessageRequest,
    ) -> ClientResult<ReceiveMessageResponse> {
        let system_attribute_names = request
            .message_system_attribute_names
            .iter()
            .map(|name| sdk::MessageSystemAttributeName::from(name.as_str()))
            .collect::<Vec<_>>();

        let call = self
            .client
            .receive_message()
            .queue_url(request.queue_url)
            .set_max_number_of_messages(request.max_number_of_messages)
            .set_visibility_timeout(request.visibility_timeout)
            .set_wait_time_seconds(request.wait_time_seconds)
            .set_message_attribute_names(Some(request.message_attribute_names))
            .set_message_system_attribute_names(Some(system_attribute_names))
            .send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("receive_message"))?
            .map_err(|e| ClientError::queue("receive_message", e))?;

        Ok(ReceiveMessageResponse {
            messages: output
                .messages
                .unwrap_or_default()
                .into_iter()
                .map(from_sdk_message)
                .collect(),
        })
    }

    async fn delete_message(&self, ctx: &CallCtx, request: DeleteMessageRequest) -> ClientResult<()> {
        let call = self
            .client
            .delete_message()
            .queue_url(request.queue_url)
            .receipt_handle(request.receipt_handle)
            .send();

        ctx.until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("delete_message"))?
            .map_err(|e| ClientError::queue("delete_message", e))?;
        Ok(())
    }

    async fn delete_message_batch(
        &self,
        ctx: &CallCtx,
        request: DeleteMessageBatchRequest,
    ) -> ClientResult<DeleteMessageBatchResponse> {
        let entries = request
            .entries
            .into_iter()
            .map(|entry| {
                sdk::DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .receipt_handle(entry.receipt_handle)
                    .build()
                    .map_err(|e| ClientError::queue("delete_message_batch", e))
            })
            .collect::<ClientResult<Vec<_>>>()?;

        let call = self
            .client
            .delete_message_batch()
            .queue_url(request.queue_url)
            .set_entries(Some(entries))
            .send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("delete_message_batch"))?
            .map_err(|e| ClientError::queue("delete_message_batch", e))?;

        Ok(DeleteMessageBatchResponse {
            successful: output.successful().iter().map(|e| e.id().to_string()).collect(),
            failed: output.failed().iter().map(from_sdk_batch_error).collect(),
        })
    }

    async fn change_message_visibility(
        &self,
        ctx: &CallCtx,
        request: ChangeMessageVisibilityRequest,
    ) -> ClientResult<()> {
        let call = self
            .client
            .change_message_visibility()
            .queue_url(request.queue_url)
            .receipt_handle(request.receipt_handle)
            .visibility_timeout(request.visibility_timeout)
            .send();

        ctx.until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("change_message_visibility"))?
            .map_err(|e| ClientError::queue("change_message_visibility", e))?;
        Ok(())
    }

    async fn change_message_visibility_batch(
        &self,
        ctx: &CallCtx,
        request: ChangeMessageVisibilityBatchRequest,
    ) -> ClientResult<ChangeMessageVisibilityBatchResponse> {
        let entries = request
            .entries
            .into_iter()
            .map(|entry| {
                sdk::ChangeMessageVisibilityBatchRequestEntry::builder()
                    .id(entry.id)
                    .receipt_handle(entry.receipt_handle)
                    .visibility_timeout(entry.visibility_timeout)
                    .build()
                    .map_err(|e| ClientError::queue("change_message_visibility_batch", e))
            })
            .collect::<ClientResult<Vec<_>>>()?;

        let call = self
            .client
            .change_message_visibility_batch()
            .queue_url(request.queue_url)
            .set_entries(Some(entries))
            .send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("change_message_visibility_batch"))?
            .map_err(|e| ClientError::queue("change_message_visibility_batch", e))?;

        Ok(ChangeMessageVisibilityBatchResponse {
            successful: output.successful().iter().map(|e| e.id().to_string()).collect(),
            failed: output.failed().iter().map(from_sdk_batch_error).collect(),
        })
    }

    async fn get_queue_url(&self, ctx: &CallCtx, queue_name: &str) -> ClientResult<String> {
        let call = self.client.get_queue_url().queue_name(queue_name).send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("get_queue_url"))?
            .map_err(|e| ClientError::queue("get_queue_url", e))?;

        output.queue_url.ok_or_else(|| {
            ClientError::queue("get_queue_url", format!("no URL returned for queue {queue_name}"))
        })
    }

    async fn get_queue_attributes(
        &self,
        ctx: &CallCtx,
        queue_url: &str,
        attribute_names: &[String],
    ) -> ClientResult<HashMap<String, String>> {
        let names = attribute_names
            .iter()
            .map(|name| sdk::QueueAttributeName::from(name.as_str()))
            .collect::<Vec<_>>();

        let call = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .set_attribute_names(Some(names))
            .send();

        let output = ctx
            .until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("get_queue_attributes"))?
            .map_err(|e| ClientError::queue("get_queue_attributes", e))?;

        Ok(output
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect())
    }

    async fn purge_queue(&self, ctx: &CallCtx, queue_url: &str) -> ClientResult<()> {
        let call = self.client.purge_queue().queue_url(queue_url).send();

        ctx.until_cancelled(call)
            .await
            .ok_or_else(|| ClientError::cancelled("purge_queue"))?
            .map_err(|e| ClientError::queue("purge_queue", e))?;
        Ok(())
    }
}
