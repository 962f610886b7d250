//! Bounding volume hierarchy construction and linearization.
//!
//! The builder produces a binary tree of AABB nodes over a triangle list;
//! the flattener serializes that tree into a fixed-stride node array the
//! compute kernel can traverse with an index stack, reordering the
//! triangles to match leaf order so that leaf payloads are plain indices.

mod build;
mod flatten;

pub use build::{build, BvhNode};
pub use flatten::{flatten, FlatBvh, FlatBvhNode};

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{build, flatten, FlatBvh};
    use crate::geometry::{Material, Ray, Triangle};

    /// Stack traversal of the flat encoding, mirroring what the kernel
    /// does: nearest hit as (reordered triangle index, distance).
    fn traverse(flat: &FlatBvh, ray: &Ray) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        let mut closest = f32::INFINITY;
        let mut stack = vec![0_usize];

        while let Some(index) = stack.pop() {
            let node = flat.nodes[index];
            let bbox = crate::geometry::Aabb::new(
                Vec3::from(node.bbox_min),
                Vec3::from(node.bbox_max),
            );
            if !ray.hits_aabb(&bbox, closest) {
                continue;
            }
            if node.is_leaf() {
                let t_index = node.triangle_index();
                if let Some(t) = ray.hits_triangle(&flat.triangles[t_index]) {
                    if t < closest {
                        closest = t;
                        best = Some((t_index, t));
                    }
                }
            } else {
                stack.push(node.b as usize);
                stack.push(node.a as usize);
            }
        }
        best
    }

    fn brute_force(triangles: &[Triangle], ray: &Ray) -> Option<f32> {
        triangles
            .iter()
            .filter_map(|triangle| ray.hits_triangle(triangle))
            .min_by(f32::total_cmp)
    }

    #[test]
    fn flat_traversal_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0xbeef);
        let triangles: Vec<Triangle> = (0..200)
            .map(|_| {
                let center = Vec3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                );
                Triangle::new(
                    center + Vec3::new(-0.7, -0.4, 0.1),
                    center + Vec3::new(0.6, -0.5, -0.2),
                    center + Vec3::new(0.0, 0.8, 0.3),
                    Vec3::ONE,
                    Material::Matte,
                )
            })
            .collect();

        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);

        let mut hits = 0;
        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-40.0..40.0),
                rng.gen_range(-40.0..40.0),
                rng.gen_range(-40.0..40.0),
            );
            let dir = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if dir.length() < 1e-3 {
                continue;
            }
            let ray = Ray::new(origin, dir.normalize());

            let expected = brute_force(&flat.triangles, &ray);
            let found = traverse(&flat, &ray).map(|(_, t)| t);
            match (expected, found) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    assert!((a - b).abs() < 1e-4, "distance mismatch: {a} vs {b}");
                    hits += 1;
                }
                (a, b) => panic!("hit disagreement: brute={a:?} bvh={b:?}"),
            }
        }
        // The cloud is dense enough that a healthy share of rays hit.
        assert!(hits > 20, "only {hits} hits; test geometry too sparse");
    }
}
