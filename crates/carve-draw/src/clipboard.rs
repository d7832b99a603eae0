//! Copied block region, the source material for paste operations.

use carve_geom::{BoundingBox, Vec3I};
use carve_map::{Block, Map};

/// Dense snapshot of a map region. Indexing matches `Map` layout.
#[derive(Clone, Debug)]
pub struct Clipboard {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    blocks: Vec<Block>,
}

impl Clipboard {
    /// Copy a region out of the map; the box is clamped to the map first.
    /// Returns None when the box lies entirely outside.
    pub fn from_map_region(map: &Map, region: BoundingBox) -> Option<Self> {
        if !region.intersects(&map.bounds()) {
            return None;
        }
        let lo = Vec3I::new(
            region.x_min.max(0),
            region.y_min.max(0),
            region.z_min.max(0),
        );
        let hi = Vec3I::new(
            region.x_max.min(map.sx as i32 - 1),
            region.y_max.min(map.sy as i32 - 1),
            region.z_max.min(map.sz as i32 - 1),
        );
        let (sx, sy, sz) = (
            (hi.x - lo.x + 1) as usize,
            (hi.y - lo.y + 1) as usize,
            (hi.z - lo.z + 1) as usize,
        );
        let mut blocks = vec![Block::AIR; sx * sy * sz];
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    let world = Vec3I::new(lo.x + x as i32, lo.y + y as i32, lo.z + z as i32);
                    if let Some(b) = map.get(world) {
                        blocks[(y * sz + z) * sx + x] = b;
                    }
                }
            }
        }
        Some(Self { sx, sy, sz, blocks })
    }

    pub fn from_blocks(sx: usize, sy: usize, sz: usize, blocks: Vec<Block>) -> Self {
        let mut b = blocks;
        b.resize(sx * sy * sz, Block::AIR);
        Self { sx, sy, sz, blocks: b }
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.sx * self.sy * self.sz
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[(y * self.sz + z) * self.sx + x]
    }

    /// Block for a world coordinate relative to `origin`, tiling the
    /// clipboard across regions larger than itself.
    pub fn get_tiled(&self, origin: Vec3I, world: Vec3I) -> Block {
        let local = world - origin;
        let x = local.x.rem_euclid(self.sx as i32) as usize;
        let y = local.y.rem_euclid(self.sy as i32) as usize;
        let z = local.z.rem_euclid(self.sz as i32) as usize;
        self.get_local(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_region_contents() {
        let mut map = Map::new(8, 8, 8);
        map.set(Vec3I::new(2, 2, 2), Block::new(9));
        map.set(Vec3I::new(3, 2, 2), Block::new(4));
        let clip = Clipboard::from_map_region(
            &map,
            BoundingBox::from_corners(Vec3I::new(2, 2, 2), Vec3I::new(3, 2, 2)),
        )
        .unwrap();
        assert_eq!((clip.sx, clip.sy, clip.sz), (2, 1, 1));
        assert_eq!(clip.get_local(0, 0, 0), Block::new(9));
        assert_eq!(clip.get_local(1, 0, 0), Block::new(4));
    }

    #[test]
    fn tiling_wraps_on_every_axis() {
        let clip = Clipboard::from_blocks(2, 1, 1, vec![Block::new(1), Block::new(2)]);
        let origin = Vec3I::new(10, 0, 0);
        assert_eq!(clip.get_tiled(origin, Vec3I::new(10, 0, 0)), Block::new(1));
        assert_eq!(clip.get_tiled(origin, Vec3I::new(11, 0, 0)), Block::new(2));
        assert_eq!(clip.get_tiled(origin, Vec3I::new(12, 0, 0)), Block::new(1));
        // Negative offsets wrap too.
        assert_eq!(clip.get_tiled(origin, Vec3I::new(9, 0, 0)), Block::new(2));
    }

    #[test]
    fn fully_outside_region_is_rejected() {
        let map = Map::new(4, 4, 4);
        let region = BoundingBox::from_corners(Vec3I::new(10, 10, 10), Vec3I::new(12, 12, 12));
        assert!(Clipboard::from_map_region(&map, region).is_none());
    }
}
