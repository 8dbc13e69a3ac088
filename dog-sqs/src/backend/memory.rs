//! In-memory queue service for development and testing.
//!
//! Messages received are hidden until deleted or until their visibility timeout is changed
//! to 0. Visibility timeouts are not timed; a received message stays in flight otherwise.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use uuid::Uuid;

use super::QueueService;
use crate::types::{
    BatchResultError, ChangeMessageVisibilityBatchRequest, ChangeMessageVisibilityBatchResponse,
    ChangeMessageVisibilityRequest, DeleteMessageBatchRequest, DeleteMessageBatchResponse,
    DeleteMessageRequest, Message, MessageAttributes, ReceiveMessageRequest,
    ReceiveMessageResponse, SendMessageBatchRequest, SendMessageBatchResponse,
    SendMessageBatchResultEntry, SendMessageRequest, SendMessageResponse,
};
use crate::{CallCtx, ClientError, ClientResult};

const QUEUE_URL_PREFIX: &str = "memory://queue/";

/// Queue operations that can be made to fail on a `MemoryQueue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueOperation {
    Send,
    Receive,
    Delete,
    ChangeVisibility,
}

/// Errors reported by the in-memory queue service
#[derive(Error, Debug)]
pub enum MemoryQueueError {
    #[error("The specified queue does not exist: {0}")]
    QueueDoesNotExist(String),

    #[error("The receipt handle is not valid for this queue: {0}")]
    ReceiptHandleIsInvalid(String),

    #[error("Injected failure for {0:?}")]
    Injected(QueueOperation),
}

impl MemoryQueueError {
    /// Error code reported on failed batch entries
    pub fn code(&self) -> &'static str {
        match self {
            Self::QueueDoesNotExist(_) => "QueueDoesNotExist",
            Self::ReceiptHandleIsInvalid(_) => "ReceiptHandleIsInvalid",
            Self::Injected(_) => "InternalError",
        }
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    message_attributes: MessageAttributes,
    sequence_number: Option<String>,
    receive_count: u32,
    receipt_handle: Option<String>,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<StoredMessage>,
    next_sequence: u64,
}

impl QueueState {
    fn in_flight_mut(&mut self, receipt_handle: &str) -> Option<&mut StoredMessage> {
        self.messages
            .iter_mut()
            .find(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
    }

    fn visible_count(&self) -> usize {
        self.messages.iter().filter(|m| m.receipt_handle.is_none()).count()
    }
}

/// In-memory queue service
#[derive(Debug, Default)]
pub struct MemoryQueue {
    queues: RwLock<HashMap<String, QueueState>>,
    failing: HashSet<QueueOperation>,
    last_receive: RwLock<Option<ReceiveMessageRequest>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call of the given operation
    pub fn fail_on(mut self, operation: QueueOperation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Create `name` if needed and return its URL
    pub fn create_queue(&self, name: &str) -> String {
        let url = format!("{QUEUE_URL_PREFIX}{name}");
        self.queues.write().entry(url.clone()).or_default();
        url
    }

    /// Bodies currently stored in the queue, in order, in flight or not
    pub fn bodies(&self, queue_url: &str) -> Vec<String> {
        self.queues
            .read()
            .get(queue_url)
            .map(|q| q.messages.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    /// Attributes of every stored message, in order
    pub fn stored_attributes(&self, queue_url: &str) -> Vec<MessageAttributes> {
        self.queues
            .read()
            .get(queue_url)
            .map(|q| q.messages.iter().map(|m| m.message_attributes.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of stored messages, in flight or not
    pub fn len(&self, queue_url: &str) -> usize {
        self.queues
            .read()
            .get(queue_url)
            .map_or(0, |q| q.messages.len())
    }

    pub fn is_empty(&self, queue_url: &str) -> bool {
        self.len(queue_url) == 0
    }

    /// Number of messages that can be received now
    pub fn visible_len(&self, queue_url: &str) -> usize {
        self.queues
            .read()
            .get(queue_url)
            .map_or(0, QueueState::visible_count)
    }

    /// The request most recently passed to `receive_message`
    pub fn last_receive_request(&self) -> Option<ReceiveMessageRequest> {
        self.last_receive.read().clone()
    }

    fn check(
        &self,
        ctx: &CallCtx,
        operation_name: &'static str,
        operation: QueueOperation,
    ) -> ClientResult<()> {
        if ctx.is_cancelled() {
            return Err(ClientError::cancelled(operation_name));
        }
        if self.failing.contains(&operation) {
            return Err(ClientError::queue(
                operation_name,
                MemoryQueueError::Injected(operation),
            ));
        }
        Ok(())
    }

    fn with_queue<T>(
        &self,
        operation: &'static str,
        queue_url: &str,
        f: impl FnOnce(&mut QueueState) -> Result<T, MemoryQueueError>,
    ) -> ClientResult<T> {
        let mut queues = self.queues.write();
        let queue = queues.get_mut(queue_url).ok_or_else(|| {
            ClientError::queue(
                operation,
                MemoryQueueError::QueueDoesNotExist(queue_url.to_string()),
            )
        })?;
        f(queue).map_err(|e| ClientError::queue(operation, e))
    }

    fn enqueue(
        queue: &mut QueueState,
        body: String,
        message_attributes: MessageAttributes,
        message_group_id: Option<&String>,
    ) -> (String, Option<String>) {
        let message_id = Uuid::new_v4().to_string();
        let sequence_number = message_group_id.map(|_| {
            queue.next_sequence += 1;
            format!("{:020}", queue.next_sequence)
        });

        queue.messages.push_back(StoredMessage {
            message_id: message_id.clone(),
            body,
            message_attributes,
            sequence_number: sequence_number.clone(),
            receive_count: 0,
            receipt_handle: None,
        });
        (message_id, sequence_number)
    }
}

/// True if attribute `name` is selected by the requested `patterns`
fn attribute_selected(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match pattern.as_str() {
        "All" | ".*" => true,
        p => match p.strip_suffix('*') {
            Some(prefix) if prefix.ends_with('.') => name.starts_with(prefix),
            _ => p == name,
        },
    })
}

fn system_attributes(stored: &StoredMessage, requested: &[String]) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let wanted = |name: &str| requested.iter().any(|r| r == "All" || r == name);

    if wanted("ApproximateReceiveCount") {
        attributes.insert(
            "ApproximateReceiveCount".to_string(),
            stored.receive_count.to_string(),
        );
    }
    if let Some(sequence) = &stored.sequence_number {
        if wanted("SequenceNumber") {
            attributes.insert("SequenceNumber".to_string(), sequence.clone());
        }
    }
    attributes
}

#[async_trait]
impl QueueService for MemoryQueue {
    async fn send_message(
        &self,
        ctx: &CallCtx,
        request: SendMessageRequest,
    ) -> ClientResult<SendMessageResponse> {
        self.check(ctx, "send_message", QueueOperation::Send)?;

        let (message_id, sequence_number) =
            self.with_queue("send_message", &request.queue_url, |queue| {
                Ok(Self::enqueue(
                    queue,
                    request.message_body,
                    request.message_attributes,
                    request.message_group_id.as_ref(),
                ))
            })?;

        Ok(SendMessageResponse {
            message_id: Some(message_id),
            md5_of_message_body: None,
            sequence_number,
        })
    }

    async fn send_message_batch(
        &self,
        ctx: &CallCtx,
        request: SendMessageBatchRequest,
    ) -> ClientResult<SendMessageBatchResponse> {
        self.check(ctx, "send_message_batch", QueueOperation::Send)?;

        let SendMessageBatchRequest { queue_url, entries } = request;
        self.with_queue("send_message_batch", &queue_url, |queue| {
            let successful = entries
                .into_iter()
                .map(|entry| {
                    let (message_id, sequence_number) = Self::enqueue(
                        queue,
                        entry.message_body,
                        entry.message_attributes,
                        entry.message_group_id.as_ref(),
                    );
                    SendMessageBatchResultEntry {
                        id: entry.id,
                        message_id,
                        md5_of_message_body: String::new(),
                        sequence_number,
                    }
                })
                .collect();

            Ok(SendMessageBatchResponse {
                successful,
                failed: Vec::new(),
            })
        })
    }

    async fn receive_message(
        &self,
        ctx: &CallCtx,
        request: ReceiveMessageRequest,
    ) -> ClientResult<ReceiveMessageResponse> {
        self.check(ctx, "receive_message", QueueOperation::Receive)?;
        *self.last_receive.write() = Some(request.clone());

        let max = request.max_number_of_messages.unwrap_or(1).clamp(1, 10) as usize;
        let messages = self.with_queue("receive_message", &request.queue_url, |queue| {
            Ok(queue
                .messages
                .iter_mut()
                .filter(|m| m.receipt_handle.is_none())
                .take(max)
                .map(|stored| {
                    let handle = Uuid::new_v4().simple().to_string();
                    stored.receipt_handle = Some(handle.clone());
                    stored.receive_count += 1;

                    let message_attributes = stored
                        .message_attributes
                        .iter()
                        .filter(|(name, _)| {
                            attribute_selected(name, &request.message_attribute_names)
                        })
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect();

                    Message {
                        message_id: Some(stored.message_id.clone()),
                        receipt_handle: handle,
                        body: stored.body.clone(),
                        md5_of_body: None,
                        attributes: system_attributes(
                            stored,
                            &request.message_system_attribute_names,
                        ),
                        message_attributes,
                    }
                })
                .collect())
        })?;

        Ok(ReceiveMessageResponse { messages })
    }

    async fn delete_message(&self, ctx: &CallCtx, request: DeleteMessageRequest) -> ClientResult<()> {
        self.check(ctx, "delete_message", QueueOperation::Delete)?;

        self.with_queue("delete_message", &request.queue_url, |queue| {
            delete_in_flight(queue, &request.receipt_handle)
        })
    }

    async fn delete_message_batch(
        &self,
        ctx: &CallCtx,
        request: DeleteMessageBatchRequest,
    ) -> ClientResult<DeleteMessageBatchResponse> {
        self.check(ctx, "delete_message_batch", QueueOperation::Delete)?;

        let DeleteMessageBatchRequest { queue_url, entries } = request;
        self.with_queue("delete_message_batch", &queue_url, |queue| {
            let mut response = DeleteMessageBatchResponse::default();
            for entry in entries {
                match delete_in_flight(queue, &entry.receipt_handle) {
                    Ok(()) => response.successful.push(entry.id),
                    Err(err) => response.failed.push(batch_error(entry.id, &err)),
                }
            }
            Ok(response)
        })
    }

    async fn change_message_visibility(
        &self,
        ctx: &CallCtx,
        request: ChangeMessageVisibilityRequest,
    ) -> ClientResult<()> {
        self.check(ctx, "change_message_visibility", QueueOperation::ChangeVisibility)?;

        self.with_queue("change_message_visibility", &request.queue_url, |queue| {
            change_visibility(queue, &request.receipt_handle, request.visibility_timeout)
        })
    }

    async fn change_message_visibility_batch(
        &self,
        ctx: &CallCtx,
        request: ChangeMessageVisibilityBatchRequest,
    ) -> ClientResult<ChangeMessageVisibilityBatchResponse> {
        self.check(
            ctx,
            "change_message_visibility_batch",
            QueueOperation::ChangeVisibility,
        )?;

        let ChangeMessageVisibilityBatchRequest { queue_url, entries } = request;
        self.with_queue("change_message_visibility_batch", &queue_url, |queue| {
            let mut response = ChangeMessageVisibilityBatchResponse::default();
            for entry in entries {
                match change_visibility(queue, &entry.receipt_handle, entry.visibility_timeout) {
                    Ok(()) => response.successful.push(entry.id),
                    Err(err) => response.failed.push(batch_error(entry.id, &err)),
                }
            }
            Ok(response)
        })
    }

    async fn get_queue_url(&self, ctx: &CallCtx, queue_name: &str) -> ClientResult<String> {
        if ctx.is_cancelled() {
            return Err(ClientError::cancelled("get_queue_url"));
        }

        let url = format!("{QUEUE_URL_PREFIX}{queue_name}");
        if self.queues.read().contains_key(&url) {
            Ok(url)
        } else {
            Err(ClientError::queue(
                "get_queue_url",
                MemoryQueueError::QueueDoesNotExist(queue_name.to_string()),
            ))
        }
    }

    async fn get_queue_attributes(
        &self,
        ctx: &CallCtx,
        queue_url: &str,
        attribute_names: &[String],
    ) -> ClientResult<HashMap<String, String>> {
        if ctx.is_cancelled() {
            return Err(ClientError::cancelled("get_queue_attributes"));
        }

        self.with_queue("get_queue_attributes", queue_url, |queue| {
            let visible = queue.visible_count();
            let all = [
                ("ApproximateNumberOfMessages", visible),
                (
                    "ApproximateNumberOfMessagesNotVisible",
                    queue.messages.len() - visible,
                ),
            ];

            Ok(all
                .into_iter()
                .filter(|(name, _)| attribute_names.iter().any(|n| n == "All" || n == name))
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect())
        })
    }

    async fn purge_queue(&self, ctx: &CallCtx, queue_url: &str) -> ClientResult<()> {
        if ctx.is_cancelled() {
            return Err(ClientError::cancelled("purge_queue"));
        }

        self.with_queue("purge_queue", queue_url, |queue| {
            queue.messages.clear();
            Ok(())
        })
    }
}

fn delete_in_flight(queue: &mut QueueState, receipt_handle: &str) -> Result<(), MemoryQueueError> {
    let position = queue
        .messages
        .iter()
        .position(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
        .ok_or_else(|| MemoryQueueError::ReceiptHandleIsInvalid(receipt_handle.to_string()))?;
    queue.messages.remove(position);
    Ok(())
}

fn change_visibility(
    queue: &mut QueueState,
    receipt_handle: &str,
    visibility_timeout: i32,
) -> Result<(), MemoryQueueError> {
    let message = queue
        .in_flight_mut(receipt_handle)
        .ok_or_else(|| MemoryQueueError::ReceiptHandleIsInvalid(receipt_handle.to_string()))?;
    if visibility_timeout == 0 {
        message.receipt_handle = None;
    }
    Ok(())
}

fn batch_error(id: String, err: &MemoryQueueError) -> BatchResultError {
    BatchResultError {
        id,
        code: err.code().to_string(),
        message: Some(err.to_string()),
        sender_fault: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeleteMessageBatchEntry, MessageAttributeValue};

    #[tokio::test]
    async fn test_send_receive_delete() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("orders");
        let ctx = CallCtx::new();

        queue
            .send_message(&ctx, SendMessageRequest::new(&url, "hello"))
            .await
            .unwrap();
        let received = queue
            .receive_message(&ctx, ReceiveMessageRequest::new(&url))
            .await
            .unwrap();
        assert_eq!(received.messages.len(), 1);
        assert_eq!(received.messages[0].body, "hello");
        assert_eq!(queue.visible_len(&url), 0);

        let handle = received.messages[0].receipt_handle.clone();
        queue
            .delete_message(&ctx, DeleteMessageRequest::new(&url, handle))
            .await
            .unwrap();
        assert!(queue.is_empty(&url));
    }

    #[tokio::test]
    async fn test_unknown_queue() {
        let queue = MemoryQueue::new();
        let err = queue
            .send_message(&CallCtx::new(), SendMessageRequest::new("memory://queue/none", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Queue { operation: "send_message", .. }));
    }

    #[tokio::test]
    async fn test_unknown_receipt_handle() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("q");
        let ctx = CallCtx::new();

        let err = queue
            .delete_message(&ctx, DeleteMessageRequest::new(&url, "nope"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("receipt handle is not valid"));

        let response = queue
            .delete_message_batch(
                &ctx,
                DeleteMessageBatchRequest::new(&url, vec![DeleteMessageBatchEntry::new("a", "nope")]),
            )
            .await
            .unwrap();
        assert!(response.successful.is_empty());
        assert_eq!(response.failed[0].code, "ReceiptHandleIsInvalid");
    }

    #[tokio::test]
    async fn test_attribute_name_selection() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("q");
        let ctx = CallCtx::new();

        let request = SendMessageRequest::new(&url, "body")
            .with_attribute("trace.id", MessageAttributeValue::string("t"))
            .with_attribute("trace.span", MessageAttributeValue::string("s"))
            .with_attribute("tenant", MessageAttributeValue::string("acme"));
        queue.send_message(&ctx, request).await.unwrap();

        let received = queue
            .receive_message(
                &ctx,
                ReceiveMessageRequest::new(&url).with_message_attribute_name("trace.*"),
            )
            .await
            .unwrap();

        let mut names: Vec<_> = received.messages[0].message_attributes.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["trace.id", "trace.span"]);
    }

    #[tokio::test]
    async fn test_no_attribute_names_returns_none() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("q");
        let ctx = CallCtx::new();

        let request =
            SendMessageRequest::new(&url, "body").with_attribute("a", MessageAttributeValue::number(1));
        queue.send_message(&ctx, request).await.unwrap();

        let received = queue
            .receive_message(&ctx, ReceiveMessageRequest::new(&url))
            .await
            .unwrap();
        assert!(received.messages[0].message_attributes.is_empty());
    }

    #[tokio::test]
    async fn test_visibility_zero_makes_message_visible_again() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("q");
        let ctx = CallCtx::new();

        queue
            .send_message(&ctx, SendMessageRequest::new(&url, "again"))
            .await
            .unwrap();
        let first = queue
            .receive_message(&ctx, ReceiveMessageRequest::new(&url))
            .await
            .unwrap();
        let handle = first.messages[0].receipt_handle.clone();

        queue
            .change_message_visibility(&ctx, ChangeMessageVisibilityRequest::new(&url, &handle, 0))
            .await
            .unwrap();

        let second = queue
            .receive_message(
                &ctx,
                ReceiveMessageRequest::new(&url).with_message_system_attribute_name("All"),
            )
            .await
            .unwrap();
        assert_ne!(second.messages[0].receipt_handle, handle);
        assert_eq!(second.messages[0].attributes["ApproximateReceiveCount"], "2");
    }

    #[tokio::test]
    async fn test_queue_attributes_and_purge() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("q");
        let ctx = CallCtx::new();

        for body in ["a", "b", "c"] {
            queue
                .send_message(&ctx, SendMessageRequest::new(&url, body))
                .await
                .unwrap();
        }
        queue
            .receive_message(&ctx, ReceiveMessageRequest::new(&url))
            .await
            .unwrap();

        let attributes = queue
            .get_queue_attributes(&ctx, &url, &["All".to_string()])
            .await
            .unwrap();
        assert_eq!(attributes["ApproximateNumberOfMessages"], "2");
        assert_eq!(attributes["ApproximateNumberOfMessagesNotVisible"], "1");

        queue.purge_queue(&ctx, &url).await.unwrap();
        assert!(queue.is_empty(&url));
        assert_eq!(queue.get_queue_url(&ctx, "q").await.unwrap(), url);
    }

    #[tokio::test]
    async fn test_cancelled_ctx() {
        let queue = MemoryQueue::new();
        let url = queue.create_queue("q");
        let ctx = CallCtx::new();
        ctx.cancellation.cancel();

        let err = queue
            .send_message(&ctx, SendMessageRequest::new(&url, "x"))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(queue.is_empty(&url));
    }

    #[test]
    fn test_attribute_patterns() {
        let all = vec!["All".to_string()];
        let prefix = vec!["a.*".to_string()];
        assert!(attribute_selected("anything", &all));
        assert!(attribute_selected("a.b", &prefix));
        assert!(!attribute_selected("ab", &prefix));
        assert!(attribute_selected("exact", &["exact".to_string()]));
    }
}
