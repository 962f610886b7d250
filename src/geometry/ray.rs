//! Rays and CPU-side intersection queries.
//!
//! The kernel performs the hot-path intersections on the GPU; these
//! mirrors exist for scene queries and for verifying the BVH encoding
//! against brute force.

use glam::Vec3;

use super::{Aabb, Triangle};

/// Distance below which a triangle hit is rejected as self-intersection.
const T_MIN: f32 = 1e-4;

/// A half-line from `origin` along `dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Direction; not required to be normalized.
    pub dir: Vec3,
}

impl Ray {
    /// Ray from `origin` along `dir`.
    #[must_use]
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    /// The point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Slab test: whether the ray enters `bbox` before `t_max`.
    #[must_use]
    pub fn hits_aabb(&self, bbox: &Aabb, t_max: f32) -> bool {
        let inv = self.dir.recip();
        let t0 = (bbox.min - self.origin) * inv;
        let t1 = (bbox.max - self.origin) * inv;
        let near = t0.min(t1);
        let far = t0.max(t1);
        let enter = near.max_element();
        let exit = far.min_element();
        enter <= exit && exit > 0.0 && enter < t_max
    }

    /// Moeller-Trumbore intersection. Returns the hit distance, or `None`
    /// for misses, backface-parallel rays, and hits closer than the
    /// self-intersection epsilon.
    #[must_use]
    pub fn hits_triangle(&self, triangle: &Triangle) -> Option<f32> {
        let e1 = triangle.v1 - triangle.v0;
        let e2 = triangle.v2 - triangle.v0;
        let p = self.dir.cross(e2);
        let det = e1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - triangle.v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = self.dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        (t > T_MIN).then_some(t)
    }
}
