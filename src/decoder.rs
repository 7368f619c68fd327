//! Draw-list decoding from frame bodies.
//!
//! ## Frame Body Layout
//!
//! All values little-endian, no padding:
//!
//! ```text
//! list_count: u32
//! per list:
//!   command_count: u32, vertex_count: u32, index_count: u32
//!   command_count × { element_count: u32, clip: f32 × 4 }
//!   vertex_count  × { x: i16, y: i16, u: i16, v: i16, r: u8, g: u8, b: u8, a: u8 }
//!   index_count   × u16
//! ```
//!
//! Positions are raw pixel coordinates, UVs are scaled by `1/32767` with the v
//! axis flipped, and color/alpha channels are scaled by `1/255`.

use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::geometry::GeometryStore;
use crate::types::{ClipRect, DrawCommand, Vertex};
use crate::{RemoteError, Result};

/// Outcome of a successfully decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSummary {
    /// Number of draw lists in the frame
    pub list_count: usize,
    /// Command count of list 0, surfaced to the window selector
    pub window_count: usize,
    /// Total vertices across all lists
    pub vertex_count: usize,
    /// Total indices across all lists
    pub index_count: usize,
}

/// Decoder writing frame bodies into a [`GeometryStore`].
pub struct DrawListDecoder;

impl DrawListDecoder {
    /// Decode a frame body and commit it to `store`.
    ///
    /// The cursor must be positioned right after the message-kind byte. Either
    /// every list decodes and the frame is committed, or the store's live
    /// geometry is left exactly as it was.
    pub fn decode(cursor: &mut ByteCursor<'_>, store: &mut GeometryStore) -> Result<FrameSummary> {
        match Self::stage(cursor, store) {
            Ok(summary) => {
                store.commit();
                debug!(
                    "Decoded frame: {} lists, {} vertices, {} indices",
                    summary.list_count, summary.vertex_count, summary.index_count
                );
                Ok(summary)
            }
            Err(e) => {
                store.discard();
                Err(e)
            }
        }
    }

    fn stage(cursor: &mut ByteCursor<'_>, store: &mut GeometryStore) -> Result<FrameSummary> {
        let list_count = cursor.read_u32()? as usize;
        store.begin_frame(list_count)?;

        let mut summary = FrameSummary { list_count, ..FrameSummary::default() };
        for list in 0..list_count {
            let counts = Self::decode_list(cursor, store, list)?;
            summary.vertex_count += counts.vertices;
            summary.index_count += counts.indices;
            if list == 0 {
                summary.window_count = counts.commands;
            }
        }

        Ok(summary)
    }

    /// Decode one list into staging slot `list`.
    fn decode_list(
        cursor: &mut ByteCursor<'_>,
        store: &mut GeometryStore,
        list: usize,
    ) -> Result<ListCounts> {
        let command_count = cursor.read_u32()? as usize;
        let vertex_count = cursor.read_u32()? as usize;
        let index_count = cursor.read_u32()? as usize;
        trace!(
            "List {}: {} commands, {} vertices, {} indices",
            list, command_count, vertex_count, index_count
        );

        store.begin_slot(list, command_count, vertex_count, index_count)?;

        let mut next_start: u64 = 0;
        for _ in 0..command_count {
            let element_count = cursor.read_u32()?;
            let clip_rect = ClipRect::new(
                cursor.read_f32()?,
                cursor.read_f32()?,
                cursor.read_f32()?,
                cursor.read_f32()?,
            );
            let start = u32::try_from(next_start).map_err(|_| {
                RemoteError::invalid_list(list, "command element counts overflow the index range")
            })?;
            store.push_command(list, DrawCommand { element_count, clip_rect, start })?;
            next_start += u64::from(element_count);
        }

        if next_start != index_count as u64 {
            return Err(RemoteError::invalid_list(
                list,
                format!("commands cover {} indices but the list has {}", next_start, index_count),
            ));
        }

        for i in 0..vertex_count {
            store.write_vertex(list, i, read_vertex(cursor)?)?;
        }

        for i in 0..index_count {
            let index = cursor.read_u16()?;
            if usize::from(index) >= vertex_count {
                return Err(RemoteError::invalid_list(
                    list,
                    format!("index {} references vertex {} of {}", i, index, vertex_count),
                ));
            }
            store.write_index(list, i, index)?;
        }

        Ok(ListCounts { commands: command_count, vertices: vertex_count, indices: index_count })
    }
}

struct ListCounts {
    commands: usize,
    vertices: usize,
    indices: usize,
}

/// Read one quantized vertex.
fn read_vertex(cursor: &mut ByteCursor<'_>) -> Result<Vertex> {
    let x = cursor.read_position_i16()?;
    let y = cursor.read_position_i16()?;
    let u = cursor.read_normalized_i16()?;
    let v = 1.0 - cursor.read_normalized_i16()?;
    let r = cursor.read_quantized_u8()?;
    let g = cursor.read_quantized_u8()?;
    let b = cursor.read_quantized_u8()?;
    let alpha = cursor.read_quantized_u8()?;

    Ok(Vertex { position: [x, y], uv: [u, v], color: [r, g, b], alpha })
}
