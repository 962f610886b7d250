//! Axis-aligned bounding boxes.

use glam::Vec3;

/// Minimum extent kept along every axis. Axes thinner than this (an
/// axis-aligned triangle has zero extent along its normal) are padded so
/// that slab intersection tests never divide a zero-width interval.
pub const AXIS_PADDING: f32 = 1e-4;

/// Axis-aligned bounding box. `min <= max` holds componentwise for every
/// box produced by this module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Componentwise minimum corner.
    pub min: Vec3,
    /// Componentwise maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box from explicit corners. The caller guarantees `min <= max`.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing the given points, with degenerate axes padded
    /// by [`AXIS_PADDING`].
    ///
    /// Padding happens here, at construction, so every downstream consumer
    /// (BVH nodes, flat node records, the GPU kernel) sees a well-formed
    /// slab on every axis.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }.padded()
    }

    /// Smallest box containing both `a` and `b`.
    ///
    /// Commutative, associative, and idempotent.
    #[must_use]
    pub fn surround(a: Self, b: Self) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis extents.
    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index (0 = x, 1 = y, 2 = z) of the widest axis.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Whether `p` lies inside the box (boundary inclusive).
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Whether `other` lies entirely inside the box.
    #[must_use]
    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    fn padded(mut self) -> Self {
        for axis in 0..3 {
            if self.max[axis] - self.min[axis] < AXIS_PADDING {
                let half = AXIS_PADDING * 0.5;
                self.min[axis] -= half;
                self.max[axis] += half;
            }
        }
        self
    }
}
