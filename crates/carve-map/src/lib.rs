//! Block grid storage and change bookkeeping.
#![forbid(unsafe_code)]

use bitflags::bitflags;
use carve_geom::{BoundingBox, Vec3I};

/// One cell of the world grid. Classic-protocol block ids fit in a byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block {
    pub id: u8,
}

impl Block {
    pub const AIR: Block = Block { id: 0 };

    #[inline]
    pub const fn new(id: u8) -> Self {
        Self { id }
    }
}

bitflags! {
    /// Why a block changed; combined flags travel with every mutation so
    /// downstream logging can tell a draw from an undo of one.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BlockChangeContext: u8 {
        const DRAWN       = 0b0000_0001;
        const UNDONE_SELF = 0b0000_0010;
        const REDONE_SELF = 0b0000_0100;
        const PASTED      = 0b0000_1000;
        const REPLACED    = 0b0001_0000;
    }
}

/// Running totals for a map, bumped on every confirmed mutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapStats {
    pub rev: u64,
    pub blocks_changed: u64,
}

/// Dense 3D block grid with world-space accessors.
pub struct Map {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    blocks: Vec<Block>,
    rev: u64,
    blocks_changed: u64,
}

impl Map {
    pub fn new(sx: usize, sy: usize, sz: usize) -> Self {
        Self {
            sx,
            sy,
            sz,
            blocks: vec![Block::AIR; sx * sy * sz],
            rev: 0,
            blocks_changed: 0,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn in_bounds(&self, p: Vec3I) -> bool {
        p.x >= 0
            && p.y >= 0
            && p.z >= 0
            && (p.x as usize) < self.sx
            && (p.y as usize) < self.sy
            && (p.z as usize) < self.sz
    }

    /// Full-map box, for clamping draw regions.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_corners(
            Vec3I::ZERO,
            Vec3I::new(self.sx as i32 - 1, self.sy as i32 - 1, self.sz as i32 - 1),
        )
    }

    #[inline]
    pub fn get(&self, p: Vec3I) -> Option<Block> {
        if !self.in_bounds(p) {
            return None;
        }
        Some(self.blocks[self.idx(p.x as usize, p.y as usize, p.z as usize)])
    }

    /// Write one cell. Returns true only when the stored value actually
    /// changed; out-of-bounds writes are ignored and return false.
    pub fn set(&mut self, p: Vec3I, b: Block) -> bool {
        if !self.in_bounds(p) {
            return false;
        }
        let i = self.idx(p.x as usize, p.y as usize, p.z as usize);
        if self.blocks[i] == b {
            return false;
        }
        self.blocks[i] = b;
        self.rev = self.rev.wrapping_add(1).max(1);
        self.blocks_changed += 1;
        true
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            rev: self.rev,
            blocks_changed: self.blocks_changed,
        }
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.sx * self.sy * self.sz
    }

    pub fn count_non_air(&self) -> usize {
        self.blocks.iter().filter(|b| **b != Block::AIR).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_real_changes_only() {
        let mut map = Map::new(8, 8, 8);
        let p = Vec3I::new(1, 2, 3);
        assert!(map.set(p, Block::new(5)));
        // Same value again is a visit, not a change.
        assert!(!map.set(p, Block::new(5)));
        assert!(map.set(p, Block::AIR));
        assert_eq!(map.stats().blocks_changed, 2);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut map = Map::new(4, 4, 4);
        assert!(!map.set(Vec3I::new(-1, 0, 0), Block::new(1)));
        assert!(!map.set(Vec3I::new(0, 4, 0), Block::new(1)));
        assert_eq!(map.get(Vec3I::new(0, 4, 0)), None);
        assert_eq!(map.stats().blocks_changed, 0);
    }

    #[test]
    fn rev_is_monotonic() {
        let mut map = Map::new(4, 4, 4);
        let r0 = map.stats().rev;
        map.set(Vec3I::new(0, 0, 0), Block::new(1));
        let r1 = map.stats().rev;
        map.set(Vec3I::new(1, 0, 0), Block::new(1));
        let r2 = map.stats().rev;
        assert!(r0 < r1 && r1 < r2);
    }

    #[test]
    fn indexing_round_trips() {
        let mut map = Map::new(5, 6, 7);
        for &(x, y, z) in &[(0, 0, 0), (4, 5, 6), (2, 3, 1)] {
            let p = Vec3I::new(x, y, z);
            map.set(p, Block::new((x + y + z) as u8 + 1));
            assert_eq!(map.get(p), Some(Block::new((x + y + z) as u8 + 1)));
        }
        assert_eq!(map.count_non_air(), 3);
    }
}
