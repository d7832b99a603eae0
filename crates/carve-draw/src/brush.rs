//! Block-choice strategies applied per visited coordinate.

use carve_geom::Vec3I;
use carve_map::{Block, Map};

/// Decides which block to write at a coordinate. Returning `None` skips the
/// cell: it still counts as visited, never as changed.
pub trait Brush: Send {
    fn next_block(&mut self, coords: Vec3I, map: &Map) -> Option<Block>;
}

/// Writes one fixed block everywhere.
pub struct SolidBrush {
    pub block: Block,
}

impl SolidBrush {
    pub fn new(block: Block) -> Self {
        Self { block }
    }
}

impl Brush for SolidBrush {
    fn next_block(&mut self, _coords: Vec3I, _map: &Map) -> Option<Block> {
        Some(self.block)
    }
}

/// Overwrites only cells currently holding one of the listed ids.
pub struct ReplaceBrush {
    pub targets: Vec<Block>,
    pub replacement: Block,
}

impl ReplaceBrush {
    pub fn new(targets: Vec<Block>, replacement: Block) -> Self {
        Self {
            targets,
            replacement,
        }
    }
}

impl Brush for ReplaceBrush {
    fn next_block(&mut self, coords: Vec3I, map: &Map) -> Option<Block> {
        let current = map.get(coords)?;
        if self.targets.contains(&current) {
            Some(self.replacement)
        } else {
            None
        }
    }
}

/// Alternates two blocks on coordinate parity.
pub struct CheckeredBrush {
    pub even: Block,
    pub odd: Block,
}

impl CheckeredBrush {
    pub fn new(even: Block, odd: Block) -> Self {
        Self { even, odd }
    }
}

impl Brush for CheckeredBrush {
    fn next_block(&mut self, coords: Vec3I, _map: &Map) -> Option<Block> {
        if (coords.x + coords.y + coords.z).rem_euclid(2) == 0 {
            Some(self.even)
        } else {
            Some(self.odd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_brush_declines_other_blocks() {
        let mut map = Map::new(4, 4, 4);
        let p = Vec3I::new(1, 1, 1);
        map.set(p, Block::new(7));
        let mut brush = ReplaceBrush::new(vec![Block::new(7)], Block::new(2));
        assert_eq!(brush.next_block(p, &map), Some(Block::new(2)));
        assert_eq!(brush.next_block(Vec3I::new(0, 0, 0), &map), None);
    }

    #[test]
    fn checkered_brush_alternates_on_parity() {
        let map = Map::new(4, 4, 4);
        let mut brush = CheckeredBrush::new(Block::new(1), Block::new(2));
        assert_eq!(brush.next_block(Vec3I::new(0, 0, 0), &map), Some(Block::new(1)));
        assert_eq!(brush.next_block(Vec3I::new(1, 0, 0), &map), Some(Block::new(2)));
        assert_eq!(brush.next_block(Vec3I::new(1, 1, 0), &map), Some(Block::new(1)));
    }
}
