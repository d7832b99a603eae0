//! Append-only journal of prior block values, replayed by undo/redo ops.

use carve_geom::{BoundingBox, Vec3I};
use carve_map::Block;

/// One journal entry: where, and what stood there before the change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoBlock {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub block: Block,
}

impl UndoBlock {
    #[inline]
    pub fn coords(&self) -> Vec3I {
        Vec3I::new(self.x, self.y, self.z)
    }
}

/// One undo generation: the ordered record of everything a single draw
/// operation overwrote. Append-only while the operation runs; read-only
/// once handed to a replay operation.
#[derive(Debug, Default)]
pub struct UndoState {
    buffer: Vec<UndoBlock>,
    bounds: Option<BoundingBox>,
}

impl UndoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, coords: Vec3I, previous: Block) {
        self.buffer.push(UndoBlock {
            x: coords.x,
            y: coords.y,
            z: coords.z,
            block: previous,
        });
        self.bounds = Some(match self.bounds {
            Some(b) => b.expand_to(coords),
            None => BoundingBox::point(coords),
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&UndoBlock> {
        self.buffer.get(index)
    }

    /// Box enclosing every recorded coordinate; None while empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_entries() {
        let mut state = UndoState::new();
        assert!(state.bounds().is_none());
        state.append(Vec3I::new(5, 5, 5), Block::AIR);
        state.append(Vec3I::new(-1, 8, 5), Block::new(3));
        let b = state.bounds().unwrap();
        assert_eq!(b.min(), Vec3I::new(-1, 5, 5));
        assert_eq!(b.max(), Vec3I::new(5, 8, 5));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut state = UndoState::new();
        for i in 0..4 {
            state.append(Vec3I::new(i, 0, 0), Block::new(i as u8));
        }
        for i in 0..4 {
            assert_eq!(state.get(i).unwrap().block, Block::new(i as u8));
        }
        assert!(state.get(4).is_none());
    }
}
