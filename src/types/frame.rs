//! Raw frame buffers retained as delta patch base

use std::sync::Arc;

use super::MessageKind;

/// Immutable binary message as received (or as reconstructed from a delta).
///
/// The buffer includes the leading kind byte, so byte offsets line up with the
/// delta frames patched against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Message kind the buffer was received as
    pub kind: MessageKind,

    /// Whole message buffer, header included (zero-copy via Arc)
    pub data: Arc<[u8]>,
}

impl RawFrame {
    /// Create a new raw frame
    pub fn new(kind: MessageKind, data: Vec<u8>) -> Self {
        Self { kind, data: data.into() }
    }

    /// Length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
