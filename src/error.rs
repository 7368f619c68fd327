//! Error types for remote draw-list processing.
//!
//! Every error raised while decoding a message is local to that message: the
//! session drops the frame, keeps its previously committed geometry and patch
//! base, and carries on with the next message.
//!
//! ## Error Categories
//!
//! - **Wire Errors**: truncated messages, unknown message kinds, malformed lists
//! - **Capacity Errors**: frames that do not fit the pre-sized geometry pool
//! - **Delta Errors**: missing patch base or a delta chain that no longer decodes
//! - **Ambient Errors**: configuration, capture files, transport failures
//!
//! ## Recovery
//!
//! ```rust
//! use remote_imgui::RemoteError;
//!
//! let error = RemoteError::connection_failed("server closed the socket");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for remote draw-list operations.
pub type Result<T, E = RemoteError> = std::result::Result<T, E>;

/// Main error type for remote draw-list operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("Message truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated { offset: usize, needed: usize, available: usize },

    #[error("Capacity exceeded for {resource}: requested {requested}, limit {limit}")]
    Capacity { resource: String, requested: usize, limit: usize },

    #[error("Delta frame received without a retained patch base")]
    MissingPatchBase,

    #[error("Delta chain desynchronized")]
    Desynchronized {
        #[source]
        source: Box<RemoteError>,
    },

    #[error("Draw list {list} is inconsistent: {details}")]
    InvalidList { list: usize, details: String },

    #[error("Unknown message kind {tag}")]
    UnknownMessage { tag: u8 },

    #[error("Empty binary message")]
    EmptyMessage,

    #[error("Failed to decompress message: {details}")]
    Decompression { details: String },

    #[error("Failed to compress message: {details}")]
    Compression { details: String },

    #[error("Invalid input command: {input:?}")]
    InvalidCommand { input: String },

    #[error("Configuration error in {path}: {details}")]
    Config { path: PathBuf, details: String },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture format error at offset {offset}: {details}")]
    CaptureFormat { offset: usize, details: String },

    #[error("Connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RemoteError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Decode errors are never retried: the same bytes would fail again. The
    /// next key frame recovers them instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Connection { .. } => true,
            RemoteError::Truncated { .. } => false,
            RemoteError::Capacity { .. } => false,
            RemoteError::MissingPatchBase => false,
            RemoteError::Desynchronized { .. } => false,
            RemoteError::InvalidList { .. } => false,
            RemoteError::UnknownMessage { .. } => false,
            RemoteError::EmptyMessage => false,
            RemoteError::Decompression { .. } => false,
            RemoteError::Compression { .. } => false,
            RemoteError::InvalidCommand { .. } => false,
            RemoteError::Config { .. } => false,
            RemoteError::File { .. } => false,
            RemoteError::CaptureFormat { .. } => false,
        }
    }

    /// Returns whether the session should wait for the next key frame.
    pub fn awaits_key_frame(&self) -> bool {
        matches!(
            self,
            RemoteError::MissingPatchBase
                | RemoteError::Desynchronized { .. }
                | RemoteError::Truncated { .. }
                | RemoteError::InvalidList { .. }
        )
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RemoteError::Truncated { .. } => vec![
                "Check that the transport delivers whole messages",
                "Verify the compression setting matches the server",
                "Wait for the next key frame",
            ],
            RemoteError::Capacity { .. } => vec![
                "Increase max_draw_lists or max_triangles in the client config",
                "Reduce the number of windows on the source application",
            ],
            RemoteError::MissingPatchBase => vec![
                "Wait for the next key frame",
                "Ask the server to send a key frame after connecting",
            ],
            RemoteError::Desynchronized { .. } => vec![
                "Wait for the next key frame",
                "Check that the transport does not drop or reorder messages",
            ],
            RemoteError::InvalidList { .. } => vec![
                "Verify the server and client speak the same protocol revision",
                "Wait for the next key frame",
            ],
            RemoteError::UnknownMessage { .. } | RemoteError::EmptyMessage => vec![
                "Verify the server and client speak the same protocol revision",
                "Verify the compression setting matches the server",
            ],
            RemoteError::Decompression { .. } => vec![
                "Verify the compression setting matches the server",
                "Check the transport for corrupted payloads",
            ],
            RemoteError::Compression { .. } => vec![
                "Check that the output writer accepts the framed bytes",
                "Retry without compression to isolate the failure",
            ],
            RemoteError::InvalidCommand { .. } => {
                vec!["Check the command name and argument count"]
            }
            RemoteError::Config { .. } => vec![
                "Check the YAML syntax of the config file",
                "Compare field names against ClientConfig",
            ],
            RemoteError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            RemoteError::CaptureFormat { .. } => vec![
                "Verify the file was written by CaptureWriter",
                "Check the capture file is not truncated",
            ],
            RemoteError::Connection { .. } => vec![
                "Ensure the source application is running with remote GUI enabled",
                "Check the server address and port",
                "Retry after the reconnect interval",
            ],
        }
    }

    /// Helper constructor for truncated reads.
    pub fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        RemoteError::Truncated { offset, needed, available }
    }

    /// Helper constructor for capacity violations.
    pub fn capacity(resource: impl Into<String>, requested: usize, limit: usize) -> Self {
        RemoteError::Capacity { resource: resource.into(), requested, limit }
    }

    /// Helper constructor for inconsistent draw lists.
    pub fn invalid_list(list: usize, details: impl Into<String>) -> Self {
        RemoteError::InvalidList { list, details: details.into() }
    }

    /// Wrap a decode failure of a patched delta frame.
    pub fn desynchronized(source: RemoteError) -> Self {
        RemoteError::Desynchronized { source: Box::new(source) }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        RemoteError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        RemoteError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        RemoteError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(path: PathBuf, details: impl Into<String>) -> Self {
        RemoteError::Config { path, details: details.into() }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        RemoteError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
