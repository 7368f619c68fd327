//! Test utilities for building wire messages and observing render output
//!
//! This module provides a wire encoder for frame messages and recording
//! collaborators that capture what the session hands to the render backend
//! and control surface. It is shared by unit tests, integration tests and
//! benches.

#![cfg(any(test, feature = "benchmark"))]

use std::ops::Range;
use std::sync::{Arc, Mutex};

use crate::control::ControlSurface;
use crate::geometry::GeometrySlot;
use crate::render::{RenderBackend, ScissorRect};
use crate::types::{FontTexture, MessageKind, Rgb};

/// Encoder for one draw list of a frame message.
///
/// Counts are derived from the pushed commands, vertices and indices, so a
/// list is consistent unless a test deliberately makes it otherwise.
#[derive(Debug, Clone, Default)]
pub struct ListBuilder {
    commands: Vec<(u32, [f32; 4])>,
    vertices: Vec<u8>,
    vertex_count: u32,
    indices: Vec<u16>,
}

impl ListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a draw command covering `element_count` indices.
    pub fn command(mut self, element_count: u32, clip: [f32; 4]) -> Self {
        self.commands.push((element_count, clip));
        self
    }

    /// Append a vertex in wire units: raw pixel position, raw i16 uv, u8 channels.
    pub fn vertex(mut self, position: [i16; 2], uv: [i16; 2], rgb: [u8; 3], alpha: u8) -> Self {
        for value in position.into_iter().chain(uv) {
            self.vertices.extend_from_slice(&value.to_le_bytes());
        }
        self.vertices.extend_from_slice(&rgb);
        self.vertices.push(alpha);
        self.vertex_count += 1;
        self
    }

    /// Append indices.
    pub fn indices(mut self, indices: &[u16]) -> Self {
        self.indices.extend_from_slice(indices);
        self
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.commands.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.vertex_count.to_le_bytes());
        out.extend_from_slice(&(self.indices.len() as u32).to_le_bytes());
        for (element_count, clip) in &self.commands {
            out.extend_from_slice(&element_count.to_le_bytes());
            for value in clip {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out.extend_from_slice(&self.vertices);
        for index in &self.indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
    }
}

/// Encoder for a whole frame message, tag byte included.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    kind: MessageKind,
    lists: Vec<ListBuilder>,
}

impl FrameBuilder {
    /// Start a key frame.
    pub fn key() -> Self {
        Self { kind: MessageKind::FrameKey, lists: Vec::new() }
    }

    pub fn list(mut self, list: ListBuilder) -> Self {
        self.lists.push(list);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![self.kind.tag()];
        out.extend_from_slice(&(self.lists.len() as u32).to_le_bytes());
        for list in &self.lists {
            list.encode(&mut out);
        }
        out
    }
}

/// Encode a font texture message from raw alpha bytes.
pub fn font_texture_message(width: u32, height: u32, alpha: &[u8]) -> Vec<u8> {
    let mut out = vec![MessageKind::FontTexture.tag()];
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(alpha);
    out
}

/// A frame with `lists` draw lists of one clipped triangle each.
///
/// List `l` is offset by `l * 10` pixels and clipped to `(0, 0, 100, 100)`.
pub fn triangle_frame(lists: usize) -> Vec<u8> {
    (0..lists)
        .fold(FrameBuilder::key(), |frame, l| {
            let offset = (l * 10) as i16;
            frame.list(
                ListBuilder::new()
                    .command(3, [0.0, 0.0, 100.0, 100.0])
                    .vertex([offset, offset], [0, 0], [255, 255, 255], 255)
                    .vertex([offset + 10, offset], [32767, 0], [255, 255, 255], 255)
                    .vertex([offset, offset + 10], [0, 32767], [255, 255, 255], 255)
                    .indices(&[0, 1, 2]),
            )
        })
        .build()
}

/// One observed render backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Clear(Rgb),
    Background { width: u32, height: u32, color: Rgb },
    Scissor(Option<ScissorRect>),
    UploadTexture { width: u32, height: u32 },
    Draw { vertex_count: usize, elements: Range<u32>, camera_offset: [f32; 2] },
}

/// Render backend that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element ranges of all indexed draws.
    pub fn draws(&self) -> Vec<Range<u32>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw { elements, .. } => Some(elements.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every scissor state set, in order.
    pub fn scissors(&self) -> Vec<Option<ScissorRect>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Scissor(scissor) => Some(*scissor),
                _ => None,
            })
            .collect()
    }

    pub fn clears(&self) -> Vec<Rgb> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Clear(color) => Some(*color),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn clear(&mut self, color: Rgb) {
        self.calls.push(BackendCall::Clear(color));
    }

    fn draw_background(&mut self, width: u32, height: u32, color: Rgb) {
        self.calls.push(BackendCall::Background { width, height, color });
    }

    fn set_scissor(&mut self, scissor: Option<ScissorRect>) {
        self.calls.push(BackendCall::Scissor(scissor));
    }

    fn upload_font_texture(&mut self, texture: &FontTexture) {
        self.calls
            .push(BackendCall::UploadTexture { width: texture.width(), height: texture.height() });
    }

    fn draw_indexed(&mut self, slot: &GeometrySlot, elements: Range<u32>, camera_offset: [f32; 2]) {
        self.calls.push(BackendCall::Draw {
            vertex_count: slot.vertex_count(),
            elements,
            camera_offset,
        });
    }
}

/// Control surface that records notifications.
///
/// Cloning shares the recorded log, so a test can keep a handle after moving
/// the surface into a session.
#[derive(Debug, Clone, Default)]
pub struct RecordingControl {
    log: Arc<Mutex<ControlLog>>,
}

#[derive(Debug, Default)]
struct ControlLog {
    statuses: Vec<String>,
    window_counts: Vec<usize>,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.log.lock().map(|log| log.statuses.clone()).unwrap_or_default()
    }

    pub fn window_counts(&self) -> Vec<usize> {
        self.log.lock().map(|log| log.window_counts.clone()).unwrap_or_default()
    }
}

impl ControlSurface for RecordingControl {
    fn connection_status_changed(&mut self, status: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.statuses.push(status.to_string());
        }
    }

    fn window_count_changed(&mut self, count: usize) {
        if let Ok(mut log) = self.log.lock() {
            log.window_counts.push(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_builder_writes_counts_before_payload() {
        let frame = FrameBuilder::key()
            .list(
                ListBuilder::new()
                    .command(3, [1.0, 2.0, 3.0, 4.0])
                    .vertex([1, -1], [0, 32767], [1, 2, 3], 4)
                    .indices(&[0, 0, 0]),
            )
            .build();

        assert_eq!(frame[0], 254);
        assert_eq!(&frame[1..5], &1u32.to_le_bytes());
        assert_eq!(&frame[5..9], &1u32.to_le_bytes());
        assert_eq!(&frame[9..13], &1u32.to_le_bytes());
        assert_eq!(&frame[13..17], &3u32.to_le_bytes());
        // header + one command + one vertex + three indices
        assert_eq!(frame.len(), 1 + 4 + 12 + 20 + 12 + 6);
    }

    #[test]
    fn triangle_frame_has_requested_lists() {
        let frame = triangle_frame(3);
        assert_eq!(&frame[1..5], &3u32.to_le_bytes());
    }

    #[test]
    fn recording_control_shares_log_between_clones() {
        let control = RecordingControl::new();
        let mut handle = control.clone();
        handle.connection_status_changed("Connected");
        handle.window_count_changed(2);

        assert_eq!(control.statuses(), vec!["Connected".to_string()]);
        assert_eq!(control.window_counts(), vec![2]);
    }
}
