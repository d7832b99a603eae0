//! Integer lattice geometry for the drawing engine (no renderer dependency).
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3I {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3I {
    pub const ZERO: Vec3I = Vec3I { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length_squared(self) -> i64 {
        let (x, y, z) = (self.x as i64, self.y as i64, self.z as i64);
        x * x + y * y + z * z
    }

    /// Euclidean distance to another point, as f64 (radius math).
    #[inline]
    pub fn distance_to(self, rhs: Vec3I) -> f64 {
        ((rhs - self).length_squared() as f64).sqrt()
    }

    /// Largest per-axis absolute difference (bounding extents).
    #[inline]
    pub fn chebyshev(self, rhs: Vec3I) -> i32 {
        let d = rhs - self;
        d.x.abs().max(d.y.abs()).max(d.z.abs())
    }
}

impl Add for Vec3I {
    type Output = Vec3I;
    #[inline]
    fn add(self, rhs: Vec3I) -> Vec3I {
        Vec3I::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3I {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3I) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3I {
    type Output = Vec3I;
    #[inline]
    fn sub(self, rhs: Vec3I) -> Vec3I {
        Vec3I::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3I {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3I) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vec3I {
    type Output = Vec3I;
    #[inline]
    fn neg(self) -> Vec3I {
        Vec3I::new(-self.x, -self.y, -self.z)
    }
}

/// Player pose: block coords plus view angles packed as protocol bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub yaw: u8,
    pub pitch: u8,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32, yaw: u8, pitch: u8) -> Self {
        Self { x, y, z, yaw, pitch }
    }

    #[inline]
    pub fn to_block_coords(self) -> Vec3I {
        Vec3I::new(self.x, self.y, self.z)
    }
}

/// Inclusive axis-aligned box, normalized so min <= max on every axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub z_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub z_max: i32,
}

impl BoundingBox {
    /// Build from two arbitrary corners; axes are normalized independently.
    pub fn from_corners(a: Vec3I, b: Vec3I) -> Self {
        Self {
            x_min: a.x.min(b.x),
            y_min: a.y.min(b.y),
            z_min: a.z.min(b.z),
            x_max: a.x.max(b.x),
            y_max: a.y.max(b.y),
            z_max: a.z.max(b.z),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3I {
        Vec3I::new(self.x_min, self.y_min, self.z_min)
    }

    #[inline]
    pub fn max(&self) -> Vec3I {
        Vec3I::new(self.x_max, self.y_max, self.z_max)
    }

    #[inline]
    pub fn width_x(&self) -> i32 {
        self.x_max - self.x_min + 1
    }

    #[inline]
    pub fn width_y(&self) -> i32 {
        self.y_max - self.y_min + 1
    }

    #[inline]
    pub fn width_z(&self) -> i32 {
        self.z_max - self.z_min + 1
    }

    #[inline]
    pub fn volume(&self) -> u64 {
        self.width_x() as u64 * self.width_y() as u64 * self.width_z() as u64
    }

    #[inline]
    pub fn contains(&self, p: Vec3I) -> bool {
        p.x >= self.x_min
            && p.x <= self.x_max
            && p.y >= self.y_min
            && p.y <= self.y_max
            && p.z >= self.z_min
            && p.z <= self.z_max
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
            && self.z_min <= other.z_max
            && self.z_max >= other.z_min
    }

    /// Smallest box covering both inputs.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            z_min: self.z_min.min(other.z_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
            z_max: self.z_max.max(other.z_max),
        }
    }

    /// Grow the box to cover one extra point.
    pub fn expand_to(&self, p: Vec3I) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(p.x),
            y_min: self.y_min.min(p.y),
            z_min: self.z_min.min(p.z),
            x_max: self.x_max.max(p.x),
            y_max: self.y_max.max(p.y),
            z_max: self.z_max.max(p.z),
        }
    }

    /// Degenerate single-cell box.
    pub fn point(p: Vec3I) -> BoundingBox {
        BoundingBox::from_corners(p, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn corners_normalize() {
        let b = BoundingBox::from_corners(Vec3I::new(5, -2, 9), Vec3I::new(-1, 4, 9));
        assert_eq!(b.min(), Vec3I::new(-1, -2, 9));
        assert_eq!(b.max(), Vec3I::new(5, 4, 9));
        assert_eq!(b.width_z(), 1);
    }

    #[test]
    fn single_cell_volume() {
        let b = BoundingBox::point(Vec3I::new(3, 3, 3));
        assert_eq!(b.volume(), 1);
        assert!(b.contains(Vec3I::new(3, 3, 3)));
        assert!(!b.contains(Vec3I::new(3, 3, 4)));
    }

    #[test]
    fn distance_and_chebyshev() {
        let a = Vec3I::new(10, 10, 10);
        let b = Vec3I::new(10, 10, 13);
        assert_eq!(a.distance_to(b), 3.0);
        assert_eq!(a.chebyshev(b), 3);
    }

    fn small_vec() -> impl Strategy<Value = Vec3I> {
        (-1000i32..1000, -1000i32..1000, -1000i32..1000).prop_map(|(x, y, z)| Vec3I::new(x, y, z))
    }

    proptest! {
        #[test]
        fn normalized_on_every_axis(a in small_vec(), b in small_vec()) {
            let bx = BoundingBox::from_corners(a, b);
            prop_assert!(bx.x_min <= bx.x_max);
            prop_assert!(bx.y_min <= bx.y_max);
            prop_assert!(bx.z_min <= bx.z_max);
        }

        #[test]
        fn corners_always_contained(a in small_vec(), b in small_vec()) {
            let bx = BoundingBox::from_corners(a, b);
            prop_assert!(bx.contains(a));
            prop_assert!(bx.contains(b));
        }

        #[test]
        fn volume_matches_widths(a in small_vec(), b in small_vec()) {
            let bx = BoundingBox::from_corners(a, b);
            let expect = bx.width_x() as u64 * bx.width_y() as u64 * bx.width_z() as u64;
            prop_assert_eq!(bx.volume(), expect);
        }

        #[test]
        fn union_covers_both(a in small_vec(), b in small_vec(), c in small_vec(), d in small_vec()) {
            let b1 = BoundingBox::from_corners(a, b);
            let b2 = BoundingBox::from_corners(c, d);
            let u = b1.union(&b2);
            prop_assert!(u.contains(a) && u.contains(b) && u.contains(c) && u.contains(d));
        }
    }
}
