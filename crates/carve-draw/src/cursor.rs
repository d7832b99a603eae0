//! Resumable coordinate producers. Each cursor is plain state advanced one
//! lattice point per call, so a half-finished operation is fully
//! inspectable and picks up exactly where the last batch stopped.

use carve_geom::{BoundingBox, Vec3I};

pub(crate) enum DrawCursor {
    Line(LineCursor),
    Ellipsoid(EllipsoidCursor),
    Region(RegionCursor),
}

impl DrawCursor {
    pub(crate) fn next(&mut self) -> Option<Vec3I> {
        match self {
            DrawCursor::Line(c) => c.next(),
            DrawCursor::Ellipsoid(c) => c.next(),
            DrawCursor::Region(c) => c.next(),
        }
    }
}

/// 3D Bresenham walk, both endpoints inclusive. The driving axis is the
/// largest extent; the two error terms carry the off-axis steps.
pub(crate) struct LineCursor {
    current: Vec3I,
    end: Vec3I,
    step: Vec3I,
    d2: Vec3I,
    err1: i32,
    err2: i32,
    axis: u8,
    emitted_first: bool,
    done: bool,
}

impl LineCursor {
    pub(crate) fn new(a: Vec3I, b: Vec3I) -> Self {
        let d = b - a;
        let step = Vec3I::new(d.x.signum(), d.y.signum(), d.z.signum());
        let abs = Vec3I::new(d.x.abs(), d.y.abs(), d.z.abs());
        let d2 = Vec3I::new(abs.x * 2, abs.y * 2, abs.z * 2);
        let (axis, err1, err2) = if abs.x >= abs.y && abs.x >= abs.z {
            (0, d2.y - abs.x, d2.z - abs.x)
        } else if abs.y >= abs.x && abs.y >= abs.z {
            (1, d2.x - abs.y, d2.z - abs.y)
        } else {
            (2, d2.x - abs.z, d2.y - abs.z)
        };
        Self {
            current: a,
            end: b,
            step,
            d2,
            err1,
            err2,
            axis,
            emitted_first: false,
            done: false,
        }
    }

    fn next(&mut self) -> Option<Vec3I> {
        if self.done {
            return None;
        }
        if !self.emitted_first {
            self.emitted_first = true;
            if self.current == self.end {
                self.done = true;
            }
            return Some(self.current);
        }
        match self.axis {
            0 => {
                if self.err1 >= 0 {
                    self.current.y += self.step.y;
                    self.err1 -= self.d2.x;
                }
                if self.err2 >= 0 {
                    self.current.z += self.step.z;
                    self.err2 -= self.d2.x;
                }
                self.err1 += self.d2.y;
                self.err2 += self.d2.z;
                self.current.x += self.step.x;
            }
            1 => {
                if self.err1 >= 0 {
                    self.current.x += self.step.x;
                    self.err1 -= self.d2.y;
                }
                if self.err2 >= 0 {
                    self.current.z += self.step.z;
                    self.err2 -= self.d2.y;
                }
                self.err1 += self.d2.x;
                self.err2 += self.d2.z;
                self.current.y += self.step.y;
            }
            _ => {
                if self.err1 >= 0 {
                    self.current.x += self.step.x;
                    self.err1 -= self.d2.z;
                }
                if self.err2 >= 0 {
                    self.current.y += self.step.y;
                    self.err2 -= self.d2.z;
                }
                self.err1 += self.d2.x;
                self.err2 += self.d2.y;
                self.current.z += self.step.z;
            }
        }
        if self.current == self.end {
            self.done = true;
        }
        Some(self.current)
    }
}

/// Raster scan over a box; yields every cell in x-outer, y, z-inner order.
pub(crate) struct RegionCursor {
    region: BoundingBox,
    pos: Option<Vec3I>,
}

impl RegionCursor {
    pub(crate) fn new(region: BoundingBox) -> Self {
        Self {
            region,
            pos: Some(region.min()),
        }
    }

    fn next(&mut self) -> Option<Vec3I> {
        let out = self.pos?;
        let mut p = out;
        p.z += 1;
        if p.z > self.region.z_max {
            p.z = self.region.z_min;
            p.y += 1;
            if p.y > self.region.y_max {
                p.y = self.region.y_min;
                p.x += 1;
            }
        }
        self.pos = if p.x > self.region.x_max { None } else { Some(p) };
        Some(out)
    }
}

/// Scans the bounding box and keeps cells passing the normalized-radius
/// test; hollow mode keeps only shell cells (inside, with an outside
/// 6-neighbor).
pub(crate) struct EllipsoidCursor {
    scan: RegionCursor,
    center: [f64; 3],
    radii: [f64; 3],
    hollow: bool,
}

impl EllipsoidCursor {
    pub(crate) fn new(bounds: BoundingBox, hollow: bool) -> Self {
        let center = [
            (bounds.x_min + bounds.x_max) as f64 / 2.0,
            (bounds.y_min + bounds.y_max) as f64 / 2.0,
            (bounds.z_min + bounds.z_max) as f64 / 2.0,
        ];
        let radii = [
            (bounds.x_max - bounds.x_min) as f64 / 2.0,
            (bounds.y_max - bounds.y_min) as f64 / 2.0,
            (bounds.z_max - bounds.z_min) as f64 / 2.0,
        ];
        Self {
            scan: RegionCursor::new(bounds),
            center,
            radii,
            hollow,
        }
    }

    fn norm(&self, p: Vec3I) -> f64 {
        let d = [
            p.x as f64 - self.center[0],
            p.y as f64 - self.center[1],
            p.z as f64 - self.center[2],
        ];
        let mut n = 0.0;
        for i in 0..3 {
            if self.radii[i] > 0.0 {
                let t = d[i] / self.radii[i];
                n += t * t;
            } else if d[i].abs() > 0.5 {
                // Flat axis: anything off the plane is outside.
                n += 4.0;
            }
        }
        n
    }

    #[inline]
    fn inside(&self, p: Vec3I) -> bool {
        self.norm(p) <= 1.0
    }

    fn on_shell(&self, p: Vec3I) -> bool {
        if !self.inside(p) {
            return false;
        }
        const NEIGHBORS: [Vec3I; 6] = [
            Vec3I::new(1, 0, 0),
            Vec3I::new(-1, 0, 0),
            Vec3I::new(0, 1, 0),
            Vec3I::new(0, -1, 0),
            Vec3I::new(0, 0, 1),
            Vec3I::new(0, 0, -1),
        ];
        NEIGHBORS.iter().any(|&d| !self.inside(p + d))
    }

    fn next(&mut self) -> Option<Vec3I> {
        while let Some(p) = self.scan.next() {
            let keep = if self.hollow {
                self.on_shell(p)
            } else {
                self.inside(p)
            };
            if keep {
                return Some(p);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut cursor: DrawCursor) -> Vec<Vec3I> {
        let mut out = Vec::new();
        while let Some(p) = cursor.next() {
            out.push(p);
        }
        out
    }

    #[test]
    fn axis_line_yields_every_cell() {
        let pts = collect(DrawCursor::Line(LineCursor::new(
            Vec3I::ZERO,
            Vec3I::new(4, 0, 0),
        )));
        assert_eq!(
            pts,
            (0..=4).map(|x| Vec3I::new(x, 0, 0)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn line_adjacent_steps_differ_by_unit_cells() {
        let pts = collect(DrawCursor::Line(LineCursor::new(
            Vec3I::new(3, -2, 7),
            Vec3I::new(-5, 4, 9),
        )));
        assert_eq!(*pts.first().unwrap(), Vec3I::new(3, -2, 7));
        assert_eq!(*pts.last().unwrap(), Vec3I::new(-5, 4, 9));
        for w in pts.windows(2) {
            let d = w[1] - w[0];
            assert!(d.x.abs() <= 1 && d.y.abs() <= 1 && d.z.abs() <= 1);
            assert_ne!(w[0], w[1]);
        }
        // Driving axis is x (extent 8): exactly 9 points.
        assert_eq!(pts.len(), 9);
    }

    #[test]
    fn degenerate_line_is_one_point() {
        let p = Vec3I::new(2, 2, 2);
        assert_eq!(collect(DrawCursor::Line(LineCursor::new(p, p))), vec![p]);
    }

    #[test]
    fn region_scan_covers_volume_once() {
        let b = BoundingBox::from_corners(Vec3I::new(0, 0, 0), Vec3I::new(2, 1, 1));
        let pts = collect(DrawCursor::Region(RegionCursor::new(b)));
        assert_eq!(pts.len() as u64, b.volume());
        let mut dedup = pts.clone();
        dedup.sort_by_key(|p| (p.x, p.y, p.z));
        dedup.dedup();
        assert_eq!(dedup.len(), pts.len());
    }

    #[test]
    fn filled_sphere_includes_poles_and_center() {
        // Radius-3 ball centered at (3,3,3).
        let b = BoundingBox::from_corners(Vec3I::ZERO, Vec3I::new(6, 6, 6));
        let pts = collect(DrawCursor::Ellipsoid(EllipsoidCursor::new(b, false)));
        assert!(pts.contains(&Vec3I::new(3, 3, 3)));
        assert!(pts.contains(&Vec3I::new(0, 3, 3)));
        assert!(pts.contains(&Vec3I::new(3, 6, 3)));
        // Box corner is well outside the ball.
        assert!(!pts.contains(&Vec3I::new(0, 0, 0)));
    }

    #[test]
    fn hollow_sphere_drops_the_interior() {
        let b = BoundingBox::from_corners(Vec3I::ZERO, Vec3I::new(6, 6, 6));
        let filled = collect(DrawCursor::Ellipsoid(EllipsoidCursor::new(b, false)));
        let shell = collect(DrawCursor::Ellipsoid(EllipsoidCursor::new(b, true)));
        assert!(!shell.contains(&Vec3I::new(3, 3, 3)));
        assert!(shell.contains(&Vec3I::new(0, 3, 3)));
        assert!(shell.len() < filled.len());
        // Every shell cell is a member of the filled set.
        for p in &shell {
            assert!(filled.contains(p));
        }
    }
}
