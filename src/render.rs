//! Clip-scissored rendering of the live geometry.
//!
//! The renderer owns no GPU state. It walks the committed draw lists of a
//! [`GeometryStore`] and drives a [`RenderBackend`], which is the only piece
//! that talks to an actual graphics API.
//!
//! ## Pass Structure
//!
//! ```text
//! inactive: scissor off, clear(inactive color)
//! active:   scissor off, clear(active color), background plane,
//!           for each list, for each command:
//!               scissor(clip), draw(start..start + element_count)
//! ```

use std::ops::Range;

use tracing::trace;

use crate::config::ClientConfig;
use crate::geometry::{GeometrySlot, GeometryStore};
use crate::types::{ClipRect, FontTexture, Rgb};

/// Scissor rectangle in framebuffer space (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScissorRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScissorRect {
    /// Convert a top-left-origin clip rectangle for a canvas `canvas_height` pixels tall.
    pub fn from_clip(clip: &ClipRect, canvas_height: f32) -> Self {
        Self {
            x: clip.min_x,
            y: canvas_height - clip.max_y,
            width: clip.width(),
            height: clip.height(),
        }
    }
}

/// Graphics API boundary.
///
/// Implementations bind the most recently uploaded font texture for every
/// indexed draw and shade with per-vertex color and alpha.
pub trait RenderBackend {
    /// Clear the whole target.
    fn clear(&mut self, color: Rgb);

    /// Fill the source application's canvas area.
    fn draw_background(&mut self, width: u32, height: u32, color: Rgb);

    /// Enable the scissor test with `scissor`, or disable it with `None`.
    fn set_scissor(&mut self, scissor: Option<ScissorRect>);

    /// Replace the bound font texture.
    fn upload_font_texture(&mut self, texture: &FontTexture);

    /// Draw the triangles of `slot` whose indices lie in `elements`.
    fn draw_indexed(&mut self, slot: &GeometrySlot, elements: Range<u32>, camera_offset: [f32; 2]);
}

/// Counters from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub lists: usize,
    pub draw_calls: usize,
    pub skipped_commands: usize,
}

/// Renders live draw lists in slot order, one scissored draw per command.
#[derive(Debug, Clone)]
pub struct ClippedRenderer {
    canvas_height: f32,
    target_width: u32,
    target_height: u32,
    active_color: Rgb,
    inactive_color: Rgb,
}

impl ClippedRenderer {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            canvas_height: config.canvas_height as f32,
            target_width: config.target_width,
            target_height: config.target_height,
            active_color: config.active_color,
            inactive_color: config.inactive_color,
        }
    }

    /// Track a resized local canvas.
    pub fn set_canvas_height(&mut self, height: u32) {
        self.canvas_height = height as f32;
    }

    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    /// Draw one frame.
    ///
    /// With `active` false only the inactive clear is issued, whatever the
    /// store holds.
    pub fn render<B>(
        &self,
        active: bool,
        store: &GeometryStore,
        camera_offset: [f32; 2],
        backend: &mut B,
    ) -> RenderStats
    where
        B: RenderBackend + ?Sized,
    {
        backend.set_scissor(None);
        if !active {
            backend.clear(self.inactive_color);
            return RenderStats::default();
        }

        backend.clear(self.active_color);
        backend.draw_background(self.target_width, self.target_height, self.active_color);

        let mut stats = RenderStats::default();
        for slot in store.live_lists() {
            if slot.commands().is_empty() {
                continue;
            }
            stats.lists += 1;

            for command in slot.commands() {
                backend.set_scissor(Some(ScissorRect::from_clip(
                    &command.clip_rect,
                    self.canvas_height,
                )));
                if command.element_count == 0 {
                    stats.skipped_commands += 1;
                    continue;
                }
                backend.draw_indexed(slot, command.elements(), camera_offset);
                stats.draw_calls += 1;
            }
        }

        trace!(
            "Rendered {} lists with {} draw calls ({} empty commands)",
            stats.lists, stats.draw_calls, stats.skipped_commands
        );
        stats
    }
}
