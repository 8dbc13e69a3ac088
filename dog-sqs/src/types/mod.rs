pub mod attributes;
pub mod message;
pub mod receipt;
pub mod send;

pub use attributes::{MessageAttributeValue, MessageAttributes};
pub use message::{Message, ReceiveMessageRequest, ReceiveMessageResponse};
pub use receipt::{
    ChangeMessageVisibilityBatchEntry, ChangeMessageVisibilityBatchRequest,
    ChangeMessageVisibilityBatchResponse, ChangeMessageVisibilityRequest, DeleteMessageBatchEntry,
    DeleteMessageBatchRequest, DeleteMessageBatchResponse, DeleteMessageRequest,
};
pub use send::{
    BatchResultError, SendMessageBatchEntry, SendMessageBatchRequest, SendMessageBatchResponse,
    SendMessageBatchResultEntry, SendMessageRequest, SendMessageResponse,
};
