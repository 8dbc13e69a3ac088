use std::collections::HashMap;
use std::sync::Arc;

use dog_offload::{BlobOperation, PayloadPointer};
use dog_sqs::constants::RESERVED_ATTRIBUTE_NAME;
use dog_sqs::{
    CallCtx, ChangeMessageVisibilityBatchEntry, ChangeMessageVisibilityBatchRequest,
    ChangeMessageVisibilityRequest, ClientError, DeleteMessageBatchEntry,
    DeleteMessageBatchRequest, DeleteMessageRequest, ExtendedClient, ExtendedClientConfig,
    LambdaEventClient, MarkerHandleCodec, MemoryBlobClient, MemoryQueue, MessageAttributeValue,
    OffloadError, QueueService, ReceiptHandleCodec, ReceiveMessageRequest,
    SendMessageBatchEntry, SendMessageBatchRequest, SendMessageRequest, SqsEvent,
    SqsEventMessageAttribute, SqsEventRecord,
};

const BUCKET: &str = "extended-payloads";

/// Test factory functions
fn enabled_config(blobs: &Arc<MemoryBlobClient>, threshold: usize) -> ExtendedClientConfig {
    ExtendedClientConfig::new()
        .with_payload_support(blobs.clone(), BUCKET)
        .with_payload_size_threshold(threshold)
}

fn create_client(
    config: ExtendedClientConfig,
) -> (ExtendedClient<MemoryQueue>, String) {
    let queue = MemoryQueue::new();
    let url = queue.create_queue("test-queue");
    (ExtendedClient::new(queue, config), url)
}

fn receive_all(url: &str) -> ReceiveMessageRequest {
    ReceiveMessageRequest::new(url)
        .with_max_number_of_messages(10)
        .with_message_attribute_name("All")
}

/// S1. Large message lifecycle: offload on send, restore on receive, cleanup on delete
#[tokio::test]
async fn test_large_message_lifecycle() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();
    let body = "b".repeat(150);

    // Act: send
    client
        .send_message(&ctx, SendMessageRequest::new(&url, body.clone()))
        .await
        .unwrap();

    // Assert: the queue carries a pointer to the configured bucket
    let sent = client.inner().bodies(&url).remove(0);
    let pointer = PayloadPointer::from_json(&sent).unwrap();
    assert_eq!(pointer.bucket_name, BUCKET);
    assert_eq!(blobs.object(BUCKET, &pointer.key).as_deref(), Some(body.as_str()));
    assert_eq!(
        client.inner().stored_attributes(&url)[0][RESERVED_ATTRIBUTE_NAME],
        MessageAttributeValue::number(150)
    );

    // Act: receive
    let received = client.receive_message(&ctx, receive_all(&url)).await.unwrap();
    let message = &received.messages[0];

    // Assert: body restored, attribute removed, handle augmented
    assert_eq!(message.body, body);
    assert!(!message.message_attributes.contains_key(RESERVED_ATTRIBUTE_NAME));
    let codec = MarkerHandleCodec::new();
    assert!(codec.is_augmented(&message.receipt_handle));
    assert_eq!(codec.recover_pointer(&message.receipt_handle).unwrap(), pointer);

    // Act: delete with the augmented handle
    client
        .delete_message(&ctx, DeleteMessageRequest::new(&url, &message.receipt_handle))
        .await
        .unwrap();

    // Assert: blob removed and the queue accepted the original handle
    assert!(blobs.is_empty());
    assert!(client.inner().is_empty(&url));
}

/// S2. Without a bucket the client is a pure pass-through
#[tokio::test]
async fn test_disabled_client_is_pass_through() {
    let (client, url) = create_client(ExtendedClientConfig::new());
    let ctx = CallCtx::new();
    let body = "b".repeat(300_000);

    assert!(!client.is_payload_support_enabled());

    // Reserved names and oversized bodies are forwarded untouched
    let request = SendMessageRequest::new(&url, body.clone())
        .with_attribute(RESERVED_ATTRIBUTE_NAME, MessageAttributeValue::number(1));
    client.send_message(&ctx, request).await.unwrap();
    assert_eq!(client.inner().bodies(&url), vec![body.clone()]);

    let received = client
        .receive_message(&ctx, ReceiveMessageRequest::new(&url))
        .await
        .unwrap();
    let message = &received.messages[0];
    assert_eq!(message.body, body);
    assert!(!MarkerHandleCodec::new().is_augmented(&message.receipt_handle));

    // Reserved attribute was not requested, so it is not returned
    let forwarded = client.inner().last_receive_request().unwrap();
    assert!(forwarded.message_attribute_names.is_empty());

    client
        .delete_message(&ctx, DeleteMessageRequest::new(&url, &message.receipt_handle))
        .await
        .unwrap();
    assert!(client.inner().is_empty(&url));
}

/// S3. Always-offload sends even tiny bodies through S3
#[tokio::test]
async fn test_always_through_s3() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100).with_always_through_s3(true));
    let ctx = CallCtx::new();

    client
        .send_message(&ctx, SendMessageRequest::new(&url, "0123456789"))
        .await
        .unwrap();

    assert_eq!(blobs.len(), 1);
    let sent = client.inner().bodies(&url).remove(0);
    assert!(PayloadPointer::from_json(&sent).is_ok());

    let received = client.receive_message(&ctx, receive_all(&url)).await.unwrap();
    assert_eq!(received.messages[0].body, "0123456789");
}

/// S4. Ten attributes leave no room for the reserved one
#[tokio::test]
async fn test_too_many_attributes_rejected_before_io() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 262_144));

    let request = (0..10).fold(SendMessageRequest::new(&url, "body"), |request, i| {
        request.with_attribute(format!("attr{i}"), MessageAttributeValue::number(i))
    });
    let err = client.send_message(&CallCtx::new(), request).await.unwrap_err();

    assert!(err.is_validation());
    assert!(err.to_string().contains("[10]"));
    assert!(blobs.is_empty());
    assert!(client.inner().is_empty(&url));
}

/// S4b. Nine attributes are fine
#[tokio::test]
async fn test_nine_attributes_accepted() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 150));

    let request = (0..9).fold(SendMessageRequest::new(&url, "x".repeat(200)), |request, i| {
        request.with_attribute(format!("attr{i}"), MessageAttributeValue::number(i))
    });
    client.send_message(&CallCtx::new(), request).await.unwrap();

    assert_eq!(blobs.len(), 1);
    assert_eq!(client.inner().stored_attributes(&url)[0].len(), 10);
}

/// S5. Callers may not set the reserved attribute
#[tokio::test]
async fn test_reserved_attribute_collision() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));

    let request = SendMessageRequest::new(&url, "x".repeat(200))
        .with_attribute(RESERVED_ATTRIBUTE_NAME, MessageAttributeValue::number(200));
    let err = client.send_message(&CallCtx::new(), request).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation { .. }));
    assert!(err.to_string().contains("is reserved"));
    assert!(blobs.is_empty());
}

/// S6. Batches offload per entry, rehydrate per message and clean up per handle
#[tokio::test]
async fn test_batch_lifecycle() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();

    let entries = vec![
        SendMessageBatchEntry::new("small", "tiny"),
        SendMessageBatchEntry::new("large-1", "1".repeat(500)),
        SendMessageBatchEntry::new("large-2", "2".repeat(500)),
    ];
    let response = client
        .send_message_batch(&ctx, SendMessageBatchRequest::new(&url, entries))
        .await
        .unwrap();
    assert_eq!(response.successful.len(), 3);
    assert_eq!(blobs.len(), 2);

    let received = client.receive_message(&ctx, receive_all(&url)).await.unwrap();
    let bodies: HashMap<String, String> = received
        .messages
        .iter()
        .map(|m| (m.body.chars().next().unwrap().to_string(), m.body.clone()))
        .collect();
    assert_eq!(bodies["t"], "tiny");
    assert_eq!(bodies["1"], "1".repeat(500));
    assert_eq!(bodies["2"], "2".repeat(500));

    let entries = received
        .messages
        .iter()
        .enumerate()
        .map(|(i, m)| DeleteMessageBatchEntry::new(i.to_string(), &m.receipt_handle))
        .collect();
    let response = client
        .delete_message_batch(&ctx, DeleteMessageBatchRequest::new(&url, entries))
        .await
        .unwrap();

    assert_eq!(response.successful.len(), 3);
    assert!(response.failed.is_empty());
    assert!(blobs.is_empty());
    assert!(client.inner().is_empty(&url));
}

/// S7. One failed offload fails the whole batch send
#[tokio::test]
async fn test_batch_store_failure_aborts_send() {
    let blobs = Arc::new(MemoryBlobClient::new().fail_on(BlobOperation::Put));
    let (client, url) = create_client(enabled_config(&blobs, 100));

    let entries = vec![
        SendMessageBatchEntry::new("small", "tiny"),
        SendMessageBatchEntry::new("large", "x".repeat(500)),
    ];
    let err = client
        .send_message_batch(&CallCtx::new(), SendMessageBatchRequest::new(&url, entries))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Payload(OffloadError::StoreFailure { .. })));
    assert!(client.inner().is_empty(&url));
}

/// S8. A failed cleanup leaves the message in the queue
#[tokio::test]
async fn test_cleanup_failure_keeps_message() {
    let blobs = Arc::new(MemoryBlobClient::new().fail_on(BlobOperation::Delete));
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();

    client
        .send_message(&ctx, SendMessageRequest::new(&url, "x".repeat(500)))
        .await
        .unwrap();
    let received = client.receive_message(&ctx, receive_all(&url)).await.unwrap();

    let err = client
        .delete_message(
            &ctx,
            DeleteMessageRequest::new(&url, &received.messages[0].receipt_handle),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Payload(OffloadError::DeleteFailure { .. })));
    assert_eq!(client.inner().len(&url), 1);
    assert_eq!(blobs.len(), 1);
}

/// S9. Visibility changes always reach the queue with the original handle
#[tokio::test]
async fn test_visibility_change_strips_handle() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();

    client
        .send_message(&ctx, SendMessageRequest::new(&url, "x".repeat(500)))
        .await
        .unwrap();
    let received = client.receive_message(&ctx, receive_all(&url)).await.unwrap();
    let handle = received.messages[0].receipt_handle.clone();

    client
        .change_message_visibility(&ctx, ChangeMessageVisibilityRequest::new(&url, &handle, 0))
        .await
        .unwrap();
    assert_eq!(client.inner().visible_len(&url), 1);

    // Replaying an augmented handle after offloading was turned off still works
    let received = client.receive_message(&ctx, receive_all(&url)).await.unwrap();
    let handle = received.messages[0].receipt_handle.clone();
    let disabled = ExtendedClient::new(client.into_inner(), ExtendedClientConfig::new());

    let response = disabled
        .change_message_visibility_batch(
            &ctx,
            ChangeMessageVisibilityBatchRequest::new(
                &url,
                vec![ChangeMessageVisibilityBatchEntry::new("only", &handle, 0)],
            ),
        )
        .await
        .unwrap();

    assert_eq!(response.successful, vec!["only".to_string()]);
    assert_eq!(disabled.inner().visible_len(&url), 1);
}

/// S10. Event batches are rehydrated like received messages
#[tokio::test]
async fn test_event_prefetch() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();
    let body = "e".repeat(400);

    client
        .send_message(&ctx, SendMessageRequest::new(&url, body.clone()))
        .await
        .unwrap();
    let pointer = client.inner().bodies(&url).remove(0);

    let mut event = SqsEvent {
        records: vec![
            SqsEventRecord {
                receipt_handle: "handle-1".to_string(),
                body: pointer.clone(),
                message_attributes: HashMap::from([(
                    RESERVED_ATTRIBUTE_NAME.to_string(),
                    SqsEventMessageAttribute {
                        string_value: Some("400".to_string()),
                        data_type: "Number".to_string(),
                        ..Default::default()
                    },
                )]),
                ..Default::default()
            },
            SqsEventRecord {
                receipt_handle: "handle-2".to_string(),
                body: "plain".to_string(),
                ..Default::default()
            },
        ],
    };

    client.fetch_payloads(&ctx, &mut event).await.unwrap();

    let codec = MarkerHandleCodec::new();
    assert_eq!(event.records[0].body, body);
    assert!(event.records[0].message_attributes.is_empty());
    assert_eq!(codec.original_handle(&event.records[0].receipt_handle), "handle-1");
    assert_eq!(
        codec.recover_pointer(&event.records[0].receipt_handle).unwrap(),
        PayloadPointer::from_json(&pointer).unwrap()
    );
    assert_eq!(event.records[1].body, "plain");
    assert_eq!(event.records[1].receipt_handle, "handle-2");
}

/// S11. Event prefetch is a no-op when offloading is disabled
#[tokio::test]
async fn test_event_prefetch_disabled() {
    let (client, _) = create_client(ExtendedClientConfig::new());
    let mut event = SqsEvent {
        records: vec![SqsEventRecord {
            body: r#"{"s3BucketName":"b","s3Key":"k"}"#.to_string(),
            message_attributes: HashMap::from([(
                RESERVED_ATTRIBUTE_NAME.to_string(),
                SqsEventMessageAttribute {
                    string_value: Some("1".to_string()),
                    data_type: "Number".to_string(),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        }],
    };
    let before = event.clone();

    client.fetch_payloads(&CallCtx::new(), &mut event).await.unwrap();
    assert_eq!(event, before);
}

/// S12. A cancelled call performs no I/O
#[tokio::test]
async fn test_cancelled_send() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();
    ctx.cancellation.cancel();

    let err = client
        .send_message(&ctx, SendMessageRequest::new(&url, "x".repeat(500)))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(blobs.is_empty());
    assert!(client.inner().is_empty(&url));
}

/// S13. Queue-level calls are forwarded verbatim
#[tokio::test]
async fn test_pass_through_surface() {
    let blobs = Arc::new(MemoryBlobClient::new());
    let (client, url) = create_client(enabled_config(&blobs, 100));
    let ctx = CallCtx::new();

    assert_eq!(client.get_queue_url(&ctx, "test-queue").await.unwrap(), url);

    client
        .send_message(&ctx, SendMessageRequest::new(&url, "one"))
        .await
        .unwrap();
    let attributes = client
        .get_queue_attributes(&ctx, &url, &["ApproximateNumberOfMessages".to_string()])
        .await
        .unwrap();
    assert_eq!(attributes["ApproximateNumberOfMessages"], "1");

    client.purge_queue(&ctx, &url).await.unwrap();
    assert!(client.inner().is_empty(&url));
}
