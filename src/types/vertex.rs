//! Decoded vertex layout

use serde::{Deserialize, Serialize};

/// One decoded vertex.
///
/// Positions are canvas pixels (z is implicitly 0). UVs, colors and alpha are
/// dequantized from the wire and the v axis is already flipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 3],
    pub alpha: f32,
}

impl Vertex {
    /// Encoded size: 4 × i16 + 4 × u8, no padding.
    pub const WIRE_SIZE: usize = 12;
}
