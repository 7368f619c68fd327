//! Binary message classification and delta reconstruction.
//!
//! Every binary message starts with a [`MessageKind`] tag:
//!
//! | Tag | Kind | Body |
//! |-----|------|------|
//! | 255 | font texture | `width: u32`, `height: u32`, `width*height` alpha bytes |
//! | 254 | key frame | draw lists (see [`crate::decoder`]) |
//! | 253 | delta frame | key frame bytes minus the previous frame, byte-wise mod 256 |
//!
//! ## Delta Frames
//!
//! Consecutive GUI frames differ by small, local changes, so the server can
//! send `D[i] = next[i] - prev[i] (mod 256)` instead of `next`. The codec keeps
//! the last successfully decoded frame as patch base and rebuilds
//! `next[i] = D[i] + prev[i] (mod 256)` for every byte index `i >= 1` both
//! buffers share. Bytes past the end of the base are taken as is, and byte 0
//! keeps the delta tag.
//!
//! The delta chain is stateful. A dropped or reordered message is not detected
//! here; it produces garbage until the next key frame, and a patched frame that
//! no longer decodes is reported as [`RemoteError::Desynchronized`].
//!
//! ## Usage Example
//!
//! ```rust
//! use remote_imgui::codec::{FrameCodec, apply_delta, diff_against};
//!
//! let previous = vec![254, 10, 20, 30];
//! let next = vec![254, 12, 20, 29, 7];
//! let mut delta = diff_against(&previous, &next);
//! apply_delta(&mut delta, &previous);
//! assert_eq!(&delta[1..], &next[1..]);
//!
//! let codec = FrameCodec::new(false);
//! assert!(codec.patch_base().is_none());
//! ```

use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::decoder::{DrawListDecoder, FrameSummary};
use crate::geometry::GeometryStore;
use crate::types::{FontTexture, MessageKind, RawFrame, texel_count};
use crate::{RemoteError, Result};

/// Result of decoding one binary message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A new font atlas is ready for upload.
    FontTexture(FontTexture),
    /// A frame was decoded and committed to the geometry store.
    Frame { kind: MessageKind, summary: FrameSummary },
}

/// Stateful decoder for the binary message stream.
#[derive(Debug, Default)]
pub struct FrameCodec {
    patch_base: Option<RawFrame>,
    compressed: bool,
}

impl FrameCodec {
    /// Create a codec; `compressed` enables LZ4 frame decompression of every message.
    pub fn new(compressed: bool) -> Self {
        Self { patch_base: None, compressed }
    }

    /// The retained patch base, if a frame has been decoded.
    pub fn patch_base(&self) -> Option<&RawFrame> {
        self.patch_base.as_ref()
    }

    /// Forget the patch base; the next delta fails until a key frame arrives.
    pub fn reset(&mut self) {
        self.patch_base = None;
    }

    /// Decode one binary message.
    ///
    /// Frames are committed to `store` only on success. On failure the patch
    /// base and the store's live geometry are unchanged.
    pub fn decode(&mut self, message: Vec<u8>, store: &mut GeometryStore) -> Result<Decoded> {
        let mut data = if self.compressed { decompress(&message)? } else { message };

        let tag = *data.first().ok_or(RemoteError::EmptyMessage)?;
        let kind = MessageKind::try_from(tag)?;
        debug!("Received {:?} message ({} bytes)", kind, data.len());

        match kind {
            MessageKind::FontTexture => decode_font_texture(&data).map(Decoded::FontTexture),
            MessageKind::FrameKey => {
                let summary = decode_frame(&data, store)?;
                self.patch_base = Some(RawFrame::new(kind, data));
                Ok(Decoded::Frame { kind, summary })
            }
            MessageKind::FrameDiff => {
                let base = self.patch_base.as_ref().ok_or(RemoteError::MissingPatchBase)?;
                if base.len() != data.len() {
                    trace!("Delta length {} differs from base length {}", data.len(), base.len());
                }
                apply_delta(&mut data, base.as_bytes());

                let summary = decode_frame(&data, store).map_err(|e| match e {
                    RemoteError::Truncated { .. } | RemoteError::InvalidList { .. } => {
                        RemoteError::desynchronized(e)
                    }
                    other => other,
                })?;
                self.patch_base = Some(RawFrame::new(kind, data));
                Ok(Decoded::Frame { kind, summary })
            }
        }
    }
}

/// Patch a delta frame in place against `base`.
///
/// Adds `base[i]` to `delta[i]` modulo 256 for `1 <= i < min(len)`.
pub fn apply_delta(delta: &mut [u8], base: &[u8]) {
    for (byte, prev) in delta.iter_mut().zip(base).skip(1) {
        *byte = byte.wrapping_add(*prev);
    }
}

/// Encode `next` as a delta frame against `base`.
///
/// The inverse of [`apply_delta`]: the result is tagged as a delta frame and
/// `apply_delta(&mut result, base)` restores every byte of `next` past the tag.
pub fn diff_against(base: &[u8], next: &[u8]) -> Vec<u8> {
    let mut delta = next.to_vec();
    for (byte, prev) in delta.iter_mut().zip(base).skip(1) {
        *byte = byte.wrapping_sub(*prev);
    }
    if let Some(tag) = delta.first_mut() {
        *tag = MessageKind::FrameDiff.tag();
    }
    delta
}

/// Decompress an LZ4-framed message.
pub fn decompress(message: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = lz4_flex::frame::FrameDecoder::new(message);
    let mut out = Vec::with_capacity(message.len() * 2);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| RemoteError::Decompression { details: e.to_string() })?;
    Ok(out)
}

/// LZ4-frame a message, as a compressing server does.
pub fn compress(message: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder
        .write_all(message)
        .map_err(|e| RemoteError::Compression { details: e.to_string() })?;
    encoder.finish().map_err(|e| RemoteError::Compression { details: e.to_string() })
}

fn decode_frame(data: &[u8], store: &mut GeometryStore) -> Result<FrameSummary> {
    let mut cursor = ByteCursor::new(data);
    cursor.skip(1)?;
    let summary = DrawListDecoder::decode(&mut cursor, store)?;
    if cursor.remaining() > 0 {
        trace!("Ignoring {} trailing bytes after frame", cursor.remaining());
    }
    Ok(summary)
}

fn decode_font_texture(data: &[u8]) -> Result<FontTexture> {
    let mut cursor = ByteCursor::new(data);
    cursor.skip(1)?;
    let width = cursor.read_u32()?;
    let height = cursor.read_u32()?;
    let alpha = cursor.take(texel_count(width, height)?)?;
    debug!("Font texture {}x{}", width, height);
    FontTexture::from_alpha(width, height, alpha)
}
