//! Receipt handles that carry the location of an offloaded payload.
//!
//! When a received message was offloaded, its receipt handle is returned to the caller with
//! the payload pointer prepended:
//!
//! ```text
//! <BUCKET_MARKER><bucket><BUCKET_MARKER><KEY_MARKER><key><KEY_MARKER><original handle>
//! ```
//!
//! so that a later delete can find and remove the blob without any caller bookkeeping.
//! The original handle is always the tail after the second key marker. `embed` rejects any
//! pointer that would not decode back to itself, which covers bucket names and keys that
//! contain a marker or end in part of one.

use dog_offload::PayloadPointer;

use crate::constants::{S3_BUCKET_NAME_MARKER, S3_KEY_MARKER};
use crate::{ClientError, ClientResult};

/// Embeds payload pointers into receipt handles and recovers them
pub trait ReceiptHandleCodec: Send + Sync {
    /// Prefix `handle` with `pointer`; fails if `handle` is already augmented
    fn embed(&self, pointer: &PayloadPointer, handle: &str) -> ClientResult<String>;

    /// True iff `handle` carries both markers
    fn is_augmented(&self, handle: &str) -> bool;

    /// The handle the queue issued; identity for handles that are not augmented
    fn original_handle(&self, handle: &str) -> String;

    /// The pointer embedded in an augmented handle
    fn recover_pointer(&self, handle: &str) -> ClientResult<PayloadPointer>;
}

/// Sentinel-marker codec, byte-compatible with the other SQS extended clients
#[derive(Debug, Clone)]
pub struct MarkerHandleCodec {
    bucket_marker: String,
    key_marker: String,
}

impl MarkerHandleCodec {
    pub fn new() -> Self {
        Self::with_markers(S3_BUCKET_NAME_MARKER, S3_KEY_MARKER)
    }

    /// Use custom markers. They must differ from each other.
    pub fn with_markers<B: Into<String>, K: Into<String>>(bucket_marker: B, key_marker: K) -> Self {
        Self {
            bucket_marker: bucket_marker.into(),
            key_marker: key_marker.into(),
        }
    }

    /// Byte range of the text between the first two occurrences of `marker`
    fn segment(handle: &str, marker: &str) -> Option<(usize, usize)> {
        let start = handle.find(marker)? + marker.len();
        let end = start + handle[start..].find(marker)?;
        Some((start, end))
    }

    fn contains_marker(&self, value: &str) -> bool {
        value.contains(&self.bucket_marker) || value.contains(&self.key_marker)
    }
}

impl Default for MarkerHandleCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptHandleCodec for MarkerHandleCodec {
    fn embed(&self, pointer: &PayloadPointer, handle: &str) -> ClientResult<String> {
        if self.is_augmented(handle) {
            return Err(ClientError::AlreadyAugmented);
        }
        if self.contains_marker(&pointer.bucket_name) || self.contains_marker(&pointer.key) {
            return Err(ClientError::validation(format!(
                "Payload pointer {pointer} contains a receipt handle marker"
            )));
        }

        let augmented = format!(
            "{bm}{bucket}{bm}{km}{key}{km}{handle}",
            bm = self.bucket_marker,
            km = self.key_marker,
            bucket = pointer.bucket_name,
            key = pointer.key,
        );

        // A value ending in a marker prefix joins the closing marker into a false match.
        let decodes = self.recover_pointer(&augmented).ok().as_ref() == Some(pointer)
            && self.original_handle(&augmented) == handle;
        if !decodes {
            return Err(ClientError::validation(format!(
                "Payload pointer {pointer} cannot be embedded in a receipt handle unambiguously"
            )));
        }
        Ok(augmented)
    }

    fn is_augmented(&self, handle: &str) -> bool {
        handle.contains(&self.bucket_marker) && handle.contains(&self.key_marker)
    }

    fn original_handle(&self, handle: &str) -> String {
        if !self.is_augmented(handle) {
            return handle.to_string();
        }

        match Self::segment(handle, &self.key_marker) {
            Some((_, end)) => handle[end + self.key_marker.len()..].to_string(),
            None => handle.to_string(),
        }
    }

    fn recover_pointer(&self, handle: &str) -> ClientResult<PayloadPointer> {
        if !self.is_augmented(handle) {
            return Err(ClientError::NotAugmented);
        }

        let (bucket_start, bucket_end) =
            Self::segment(handle, &self.bucket_marker).ok_or(ClientError::NotAugmented)?;
        let (key_start, key_end) =
            Self::segment(handle, &self.key_marker).ok_or(ClientError::NotAugmented)?;

        Ok(PayloadPointer::new(
            &handle[bucket_start..bucket_end],
            &handle[key_start..key_end],
        ))
    }
}
