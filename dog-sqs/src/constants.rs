/// Default offload threshold: the SQS maximum message size (256 KiB)
pub const DEFAULT_MESSAGE_SIZE_THRESHOLD: usize = 262_144;

/// Message attributes SQS accepts per message
pub const SQS_MAX_MESSAGE_ATTRIBUTES: usize = 10;

/// Caller attributes allowed on an offloadable message; one slot is kept for the reserved attribute
pub const MAX_ALLOWED_ATTRIBUTES: usize = SQS_MAX_MESSAGE_ATTRIBUTES - 1;

/// Marks a body that was replaced by a payload pointer; carries the original body size
pub const RESERVED_ATTRIBUTE_NAME: &str = "ExtendedPayloadSize";

pub const S3_BUCKET_NAME_MARKER: &str = "-..s3BucketName..-";
pub const S3_KEY_MARKER: &str = "-..s3Key..-";
