//! Pre-sized geometry pool for decoded draw lists.
//!
//! The pool is allocated once, at session start, for a fixed number of draw
//! lists and a fixed triangle budget per list. It is double-buffered: the
//! decoder writes into the *staging* set while the renderer keeps reading the
//! *live* set, and a frame only becomes visible when [`GeometryStore::commit`]
//! swaps the two. A frame that fails halfway is dropped with
//! [`GeometryStore::discard`] and never shows partial geometry.
//!
//! Buffers are reused in place across frames; steady-state decoding does not
//! allocate.

use tracing::trace;

use crate::types::{DrawCommand, Vertex};
use crate::{RemoteError, Result};

/// Default number of draw-list slots in the pool.
pub const MAX_DRAW_LISTS: usize = 20;

/// Default triangle budget per draw list; `3 * MAX_TRIANGLES` indices fit u16.
pub const MAX_TRIANGLES: usize = 21_844;

/// Geometry of one draw list.
///
/// Arrays are allocated at full capacity; accessors expose only the range
/// written by the most recent frame.
#[derive(Debug, Clone)]
pub struct GeometrySlot {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    colors: Vec<[f32; 3]>,
    alphas: Vec<f32>,
    indices: Vec<u16>,
    commands: Vec<DrawCommand>,
    declared_commands: usize,
    vertex_count: usize,
    index_count: usize,
}

impl GeometrySlot {
    fn with_capacity(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; vertex_capacity],
            uvs: vec![[0.0; 2]; vertex_capacity],
            colors: vec![[0.0; 3]; vertex_capacity],
            alphas: vec![0.0; vertex_capacity],
            indices: vec![0; index_capacity],
            commands: Vec::new(),
            declared_commands: 0,
            vertex_count: 0,
            index_count: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Vertex positions with z fixed at 0.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions[..self.vertex_count]
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs[..self.vertex_count]
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors[..self.vertex_count]
    }

    pub fn alphas(&self) -> &[f32] {
        &self.alphas[..self.vertex_count]
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices[..self.index_count]
    }

    /// Draw commands in declaration order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Reassemble the vertex at `index`.
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        if index >= self.vertex_count {
            return None;
        }
        let [x, y, _] = self.positions[index];
        Some(Vertex {
            position: [x, y],
            uv: self.uvs[index],
            color: self.colors[index],
            alpha: self.alphas[index],
        })
    }

    fn reset(&mut self, command_count: usize, vertex_count: usize, index_count: usize) {
        self.commands.clear();
        self.commands.reserve(command_count);
        self.declared_commands = command_count;
        self.vertex_count = vertex_count;
        self.index_count = index_count;
    }
}

/// Fixed pool of double-buffered draw-list slots.
#[derive(Debug)]
pub struct GeometryStore {
    live: Vec<GeometrySlot>,
    staging: Vec<GeometrySlot>,
    live_lists: usize,
    staged_lists: usize,
    vertex_capacity: usize,
    index_capacity: usize,
}

impl GeometryStore {
    /// Allocate `slots` draw lists of `max_triangles` triangles each.
    pub fn new(slots: usize, max_triangles: usize) -> Self {
        let vertex_capacity = max_triangles * 3;
        let index_capacity = max_triangles * 3;
        let make = || {
            (0..slots)
                .map(|_| GeometrySlot::with_capacity(vertex_capacity, index_capacity))
                .collect::<Vec<_>>()
        };

        Self {
            live: make(),
            staging: make(),
            live_lists: 0,
            staged_lists: 0,
            vertex_capacity,
            index_capacity,
        }
    }

    /// Number of draw-list slots.
    pub fn capacity(&self) -> usize {
        self.live.len()
    }

    /// Maximum vertices per draw list.
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    /// Maximum indices per draw list.
    pub fn index_capacity(&self) -> usize {
        self.index_capacity
    }

    /// Start staging a frame of `list_count` draw lists.
    ///
    /// Fails before touching any slot if the pool is too small.
    pub fn begin_frame(&mut self, list_count: usize) -> Result<()> {
        if list_count > self.capacity() {
            return Err(RemoteError::capacity("draw lists", list_count, self.capacity()));
        }
        self.staged_lists = 0;
        Ok(())
    }

    /// Prepare staging slot `slot` for a list of the given sizes.
    pub fn begin_slot(
        &mut self,
        slot: usize,
        command_count: usize,
        vertex_count: usize,
        index_count: usize,
    ) -> Result<()> {
        let capacity = self.capacity();
        if vertex_count > self.vertex_capacity {
            return Err(RemoteError::capacity(
                format!("vertices in draw list {slot}"),
                vertex_count,
                self.vertex_capacity,
            ));
        }
        if index_count > self.index_capacity {
            return Err(RemoteError::capacity(
                format!("indices in draw list {slot}"),
                index_count,
                self.index_capacity,
            ));
        }
        if command_count > self.index_capacity {
            return Err(RemoteError::capacity(
                format!("commands in draw list {slot}"),
                command_count,
                self.index_capacity,
            ));
        }

        let target = self
            .staging
            .get_mut(slot)
            .ok_or_else(|| RemoteError::capacity("draw lists", slot + 1, capacity))?;
        target.reset(command_count, vertex_count, index_count);
        self.staged_lists = self.staged_lists.max(slot + 1);
        Ok(())
    }

    /// Write vertex `index` of staging slot `slot`.
    pub fn write_vertex(&mut self, slot: usize, index: usize, vertex: Vertex) -> Result<()> {
        let target = self.staged_slot_mut(slot)?;
        if index >= target.vertex_count {
            return Err(RemoteError::capacity(
                format!("vertices in draw list {slot}"),
                index + 1,
                target.vertex_count,
            ));
        }

        let [x, y] = vertex.position;
        target.positions[index] = [x, y, 0.0];
        target.uvs[index] = vertex.uv;
        target.colors[index] = vertex.color;
        target.alphas[index] = vertex.alpha;
        Ok(())
    }

    /// Write index `index` of staging slot `slot`.
    pub fn write_index(&mut self, slot: usize, index: usize, value: u16) -> Result<()> {
        let target = self.staged_slot_mut(slot)?;
        if index >= target.index_count {
            return Err(RemoteError::capacity(
                format!("indices in draw list {slot}"),
                index + 1,
                target.index_count,
            ));
        }
        target.indices[index] = value;
        Ok(())
    }

    /// Append a draw command to staging slot `slot`.
    pub fn push_command(&mut self, slot: usize, command: DrawCommand) -> Result<()> {
        let target = self.staged_slot_mut(slot)?;
        if target.commands.len() >= target.declared_commands {
            return Err(RemoteError::capacity(
                format!("commands in draw list {slot}"),
                target.commands.len() + 1,
                target.declared_commands,
            ));
        }
        target.commands.push(command);
        Ok(())
    }

    /// Make the staged frame visible.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.live, &mut self.staging);
        self.live_lists = self.staged_lists;
        self.staged_lists = 0;
        trace!("Committed {} draw lists", self.live_lists);
    }

    /// Drop everything staged since [`GeometryStore::begin_frame`].
    pub fn discard(&mut self) {
        self.staged_lists = 0;
    }

    /// Hide all live geometry.
    pub fn clear(&mut self) {
        self.live_lists = 0;
    }

    /// Number of committed draw lists.
    pub fn live_list_count(&self) -> usize {
        self.live_lists
    }

    /// Committed draw lists in ascending slot order.
    pub fn live_lists(&self) -> &[GeometrySlot] {
        &self.live[..self.live_lists]
    }

    /// Committed draw list at `slot`.
    pub fn slot(&self, slot: usize) -> Option<&GeometrySlot> {
        self.live_lists().get(slot)
    }

    fn staged_slot_mut(&mut self, slot: usize) -> Result<&mut GeometrySlot> {
        if slot >= self.staged_lists {
            return Err(RemoteError::capacity("draw lists", slot + 1, self.staged_lists));
        }
        Ok(&mut self.staging[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClipRect;

    fn vertex(x: f32) -> Vertex {
        Vertex { position: [x, x + 1.0], uv: [0.5, 0.25], color: [1.0, 0.0, 0.0], alpha: 1.0 }
    }

    fn stage_triangle(store: &mut GeometryStore, slot: usize) {
        store.begin_slot(slot, 1, 3, 3).unwrap();
        for i in 0..3 {
            store.write_vertex(slot, i, vertex(i as f32)).unwrap();
            store.write_index(slot, i, i as u16).unwrap();
        }
        store
            .push_command(
                slot,
                DrawCommand { element_count: 3, clip_rect: ClipRect::default(), start: 0 },
            )
            .unwrap();
    }

    #[test]
    fn staged_geometry_is_invisible_until_commit() {
        let mut store = GeometryStore::new(2, 4);
        store.begin_frame(1).unwrap();
        stage_triangle(&mut store, 0);
        assert_eq!(store.live_list_count(), 0);

        store.commit();
        let slot = store.slot(0).expect("slot 0 committed");
        assert_eq!(slot.vertex_count(), 3);
        assert_eq!(slot.indices(), &[0, 1, 2]);
        assert_eq!(slot.positions()[1], [1.0, 2.0, 0.0]);
        assert_eq!(slot.vertex(2), Some(vertex(2.0)));
        assert_eq!(slot.vertex(3), None);
    }

    #[test]
    fn discard_keeps_previous_frame() {
        let mut store = GeometryStore::new(2, 4);
        store.begin_frame(1).unwrap();
        stage_triangle(&mut store, 0);
        store.commit();

        store.begin_frame(2).unwrap();
        stage_triangle(&mut store, 0);
        stage_triangle(&mut store, 1);
        store.discard();

        assert_eq!(store.live_list_count(), 1);
        assert_eq!(store.slot(0).unwrap().index_count(), 3);
    }

    #[test]
    fn list_count_over_capacity_is_rejected() {
        let mut store = GeometryStore::new(2, 4);
        match store.begin_frame(3) {
            Err(RemoteError::Capacity { requested, limit, .. }) => {
                assert_eq!(requested, 3);
                assert_eq!(limit, 2);
            }
            other => panic!("Expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn oversize_lists_are_rejected_before_writing() {
        let mut store = GeometryStore::new(1, 4);
        store.begin_frame(1).unwrap();
        assert!(matches!(store.begin_slot(0, 1, 13, 3), Err(RemoteError::Capacity { .. })));
        assert!(matches!(store.begin_slot(0, 1, 3, 13), Err(RemoteError::Capacity { .. })));
        assert!(matches!(store.begin_slot(1, 1, 3, 3), Err(RemoteError::Capacity { .. })));
    }

    #[test]
    fn writes_outside_declared_counts_fail() {
        let mut store = GeometryStore::new(1, 4);
        store.begin_frame(1).unwrap();
        store.begin_slot(0, 1, 2, 2).unwrap();

        assert!(store.write_vertex(0, 2, vertex(0.0)).is_err());
        assert!(store.write_index(0, 2, 0).is_err());
        let command = DrawCommand::default();
        store.push_command(0, command).unwrap();
        assert!(store.push_command(0, command).is_err());
    }

    #[test]
    fn buffers_are_reused_across_frames() {
        let mut store = GeometryStore::new(1, 4);
        let original = store.live[0].positions.as_ptr();

        for _ in 0..2 {
            store.begin_frame(1).unwrap();
            stage_triangle(&mut store, 0);
            store.commit();
        }

        assert_eq!(store.live[0].positions.as_ptr(), original);
        assert_eq!(store.live[0].positions.len(), store.vertex_capacity());
    }

    #[test]
    fn clear_hides_live_lists() {
        let mut store = GeometryStore::new(1, 4);
        store.begin_frame(1).unwrap();
        stage_triangle(&mut store, 0);
        store.commit();
        store.clear();
        assert!(store.live_lists().is_empty());
    }
}
