//! Draw commands and clip rectangles

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Clip rectangle of a draw command, in canvas space (origin top-left, y down).
///
/// The wire carries four floats; they are the rectangle's corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl ClipRect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// A clip-scoped sub-range of a draw list's index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    /// Number of indices this command consumes
    pub element_count: u32,
    /// Scissor region for the command
    pub clip_rect: ClipRect,
    /// First index, the prefix sum of earlier commands' element counts
    pub start: u32,
}

impl DrawCommand {
    /// Index range drawn by this command.
    pub fn elements(&self) -> Range<u32> {
        self.start..self.start + self.element_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_extent_is_measured_between_corners() {
        let clip = ClipRect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(clip.width(), 100.0);
        assert_eq!(clip.height(), 50.0);
    }

    #[test]
    fn elements_start_at_prefix_offset() {
        let command = DrawCommand { element_count: 6, clip_rect: ClipRect::default(), start: 3 };
        assert_eq!(command.elements(), 3..9);
    }
}
