//! Recorded message streams for offline replay.
//!
//! A capture file stores the server-to-client messages of one connection so a
//! session can be replayed without the source application.
//!
//! ## Format
//!
//! All integers little-endian:
//!
//! ```text
//! magic:   b"RIMC"
//! version: u32 (1)
//! records: { kind: u8 (0 = text, 1 = binary), len: u32, payload: [u8; len] }*
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use remote_imgui::capture::{CaptureReader, CaptureWriter};
//! use remote_imgui::transport::Message;
//!
//! fn round_trip() -> remote_imgui::Result<()> {
//!     let mut writer = CaptureWriter::new(Vec::new())?;
//!     writer.write_text("ImInit")?;
//!     writer.write_binary(&[254, 0, 0, 0, 0])?;
//!     let bytes = writer.finish()?;
//!
//!     let mut reader = CaptureReader::from_bytes(bytes)?;
//!     while let Some(message) = reader.read_next()? {
//!         println!("{:?}", message);
//!     }
//!     Ok(())
//! }
//! # round_trip().unwrap();
//! ```
//!
//! ## Performance Notes
//!
//! - The whole file is loaded into memory when opened
//! - Records are parsed lazily, one per `read_next` call

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cursor::ByteCursor;
use crate::transport::Message;
use crate::{RemoteError, Result};

/// File magic.
pub const CAPTURE_MAGIC: &[u8; 4] = b"RIMC";

/// Current format version.
pub const CAPTURE_VERSION: u32 = 1;

const HEADER_SIZE: usize = 8;
const RECORD_TEXT: u8 = 0;
const RECORD_BINARY: u8 = 1;

/// Streams messages into a capture file.
pub struct CaptureWriter<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> CaptureWriter<W> {
    /// Write the file header and return a writer for records.
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(CAPTURE_MAGIC)?;
        writer.write_all(&CAPTURE_VERSION.to_le_bytes())?;
        Ok(Self { writer, records: 0 })
    }

    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.write_record(RECORD_TEXT, text.as_bytes())
    }

    pub fn write_binary(&mut self, payload: &[u8]) -> Result<()> {
        self.write_record(RECORD_BINARY, payload)
    }

    /// Record a transport message. Lifecycle events are not stored.
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        match message {
            Message::Text(text) => self.write_text(text),
            Message::Binary(payload) => self.write_binary(payload),
            Message::Event(_) => Ok(()),
        }
    }

    /// Records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        debug!("Capture finished with {} records", self.records);
        Ok(self.writer)
    }

    fn write_record(&mut self, kind: u8, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            RemoteError::capacity("capture record bytes", payload.len(), u32::MAX as usize)
        })?;
        self.writer.write_all(&[kind])?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(payload)?;
        self.records += 1;
        Ok(())
    }
}

/// Sequential reader over an in-memory capture file.
pub struct CaptureReader {
    data: Vec<u8>,
    position: usize,
    current_record: usize,
    path: PathBuf,
}

impl CaptureReader {
    /// Load a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|e| RemoteError::file_error(path.clone(), e))?;
        let reader = Self::from_bytes_with_path(data, path)?;
        info!("Opened capture file {}", reader.path.display());
        Ok(reader)
    }

    /// Read a capture held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_path(data, PathBuf::from("<memory>"))
    }

    fn from_bytes_with_path(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        let mut cursor = ByteCursor::new(&data);
        let magic = cursor.take(CAPTURE_MAGIC.len()).map_err(format_error)?;
        if magic != CAPTURE_MAGIC {
            return Err(RemoteError::CaptureFormat {
                offset: 0,
                details: format!("bad magic {:02x?}", magic),
            });
        }
        let version = cursor.read_u32().map_err(format_error)?;
        if version != CAPTURE_VERSION {
            return Err(RemoteError::CaptureFormat {
                offset: 4,
                details: format!("unsupported version {version}"),
            });
        }

        Ok(Self { data, position: HEADER_SIZE, current_record: 0, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the next record to be read.
    pub fn current_record(&self) -> usize {
        self.current_record
    }

    /// Whether every record has been read.
    pub fn is_finished(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Read the next record, or `None` at the end of the file.
    pub fn read_next(&mut self) -> Result<Option<Message>> {
        if self.is_finished() {
            return Ok(None);
        }

        let mut cursor = ByteCursor::new(&self.data[self.position..]);
        let start = self.position;
        let at = |e: RemoteError| match e {
            RemoteError::Truncated { offset, needed, available } => RemoteError::CaptureFormat {
                offset: start + offset,
                details: format!("record truncated: needed {needed} bytes, {available} available"),
            },
            other => other,
        };

        let kind = cursor.read_u8().map_err(at)?;
        let len = cursor.read_u32().map_err(at)? as usize;
        let payload = cursor.take(len).map_err(at)?;

        let message = match kind {
            RECORD_TEXT => Message::Text(String::from_utf8(payload.to_vec()).map_err(|e| {
                RemoteError::CaptureFormat { offset: start, details: e.to_string() }
            })?),
            RECORD_BINARY => Message::Binary(payload.to_vec()),
            other => {
                return Err(RemoteError::CaptureFormat {
                    offset: start,
                    details: format!("unknown record kind {other}"),
                });
            }
        };

        self.position += cursor.position();
        self.current_record += 1;
        Ok(Some(message))
    }

    /// Start over from the first record.
    pub fn rewind(&mut self) {
        self.position = HEADER_SIZE;
        self.current_record = 0;
    }
}

fn format_error(e: RemoteError) -> RemoteError {
    match e {
        RemoteError::Truncated { offset, .. } => {
            RemoteError::CaptureFormat { offset, details: "header truncated".to_string() }
        }
        other => other,
    }
}
