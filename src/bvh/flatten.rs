//! Depth-first linearization of a BVH into a GPU-traversable node array.

use bytemuck::{Pod, Zeroable};

use super::BvhNode;
use crate::geometry::Triangle;

/// One record of the flattened hierarchy. 48-byte stride, vec3 fields
/// padded to 16-byte boundaries so the layout matches the kernel's storage
/// struct exactly.
///
/// Child encoding: an internal node stores its children's array indices in
/// `a` and `b`; a leaf stores `a = -(triangle + 1)` and `b = -1`, where
/// `triangle` indexes the reordered triangle list.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatBvhNode {
    /// Minimum corner of the node's box.
    pub bbox_min: [f32; 3],
    _pad0: f32,
    /// Maximum corner of the node's box.
    pub bbox_max: [f32; 3],
    _pad1: f32,
    /// Left child index, or the sign-encoded triangle index of a leaf.
    pub a: i32,
    /// Right child index, or -1 for a leaf.
    pub b: i32,
    _pad2: [i32; 2],
}

impl FlatBvhNode {
    /// Whether this record encodes a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.a < 0
    }

    /// The reordered-triangle index of a leaf record.
    ///
    /// Meaningless for internal records; callers check [`is_leaf`] first.
    ///
    /// [`is_leaf`]: Self::is_leaf
    #[must_use]
    pub fn triangle_index(&self) -> usize {
        (-(self.a + 1)) as usize
    }
}

/// A flattened hierarchy: the node array plus the triangle list reordered
/// to leaf-visitation order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatBvh {
    /// Depth-first pre-order node records; the root is entry 0.
    pub nodes: Vec<FlatBvhNode>,
    /// Input triangles, permuted so that entry `t` is the triangle of the
    /// `t`-th leaf encountered during flattening.
    pub triangles: Vec<Triangle>,
}

impl FlatBvh {
    /// The node array as raw bytes for upload.
    #[must_use]
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }
}

/// Flatten `root` into pre-order records, cloning `triangles` into leaf
/// order as it goes.
///
/// For any internal node at index `i`, the left child lands at `i + 1`
/// (its subtree is emitted immediately after it), so the kernel can favor
/// near-child traversal without pointer chasing.
#[must_use]
pub fn flatten(root: &BvhNode, triangles: &[Triangle]) -> FlatBvh {
    let mut nodes = Vec::with_capacity(root.node_count());
    let mut reordered = Vec::with_capacity(root.leaf_count());
    let _ = flatten_node(root, triangles, &mut nodes, &mut reordered);
    FlatBvh {
        nodes,
        triangles: reordered,
    }
}

/// Emit `node` and its subtree; returns the index the node landed at.
fn flatten_node(
    node: &BvhNode,
    triangles: &[Triangle],
    nodes: &mut Vec<FlatBvhNode>,
    reordered: &mut Vec<Triangle>,
) -> i32 {
    let my = nodes.len();
    let bbox = node.bbox();
    // Children are patched in after the subtrees are emitted.
    nodes.push(FlatBvhNode {
        bbox_min: bbox.min.to_array(),
        _pad0: 0.0,
        bbox_max: bbox.max.to_array(),
        _pad1: 0.0,
        a: 0,
        b: -1,
        _pad2: [0; 2],
    });

    match node {
        BvhNode::Internal { left, right, .. } => {
            let li = flatten_node(left, triangles, nodes, reordered);
            let ri = flatten_node(right, triangles, nodes, reordered);
            nodes[my].a = li;
            nodes[my].b = ri;
        }
        BvhNode::Leaf { triangle, .. } => {
            let t = reordered.len() as i32;
            reordered.push(triangles[*triangle].clone());
            nodes[my].a = -(t + 1);
            nodes[my].b = -1;
        }
    }

    my as i32
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::bvh::build;
    use crate::geometry::Material;

    fn tri_at(center: Vec3) -> Triangle {
        Triangle::new(
            center + Vec3::new(-0.5, -0.5, 0.0),
            center + Vec3::new(0.5, -0.5, 0.0),
            center + Vec3::new(0.0, 0.5, 0.0),
            Vec3::ONE,
            Material::Matte,
        )
    }

    #[test]
    fn record_stride_is_48_bytes() {
        assert_eq!(std::mem::size_of::<FlatBvhNode>(), 48);
    }

    #[test]
    fn single_triangle_flattens_to_one_leaf() {
        let triangles = vec![tri_at(Vec3::ZERO)];
        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);

        assert_eq!(flat.nodes.len(), 1);
        assert_eq!(flat.triangles.len(), 1);
        let node = flat.nodes[0];
        assert_eq!(node.a, -1);
        assert_eq!(node.b, -1);
        assert_eq!(node.bbox_min, triangles[0].bbox.min.to_array());
        assert_eq!(node.bbox_max, triangles[0].bbox.max.to_array());
    }

    #[test]
    fn two_opposite_triangles_flatten_to_three_nodes() {
        let triangles =
            vec![tri_at(Vec3::new(-10.0, 0.0, 0.0)), tri_at(Vec3::new(10.0, 0.0, 0.0))];
        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);

        assert_eq!(flat.nodes.len(), 3);
        let rootn = flat.nodes[0];
        assert_eq!((rootn.a, rootn.b), (1, 2));
        // Left leaf is the smaller x-center, which was emitted first.
        assert_eq!(flat.nodes[1].triangle_index(), 0);
        assert_eq!(flat.triangles[0].bbox, triangles[0].bbox);
        // Root box encloses both children.
        for child in [flat.nodes[1], flat.nodes[2]] {
            for axis in 0..3 {
                assert!(rootn.bbox_min[axis] <= child.bbox_min[axis]);
                assert!(rootn.bbox_max[axis] >= child.bbox_max[axis]);
            }
        }
    }

    #[test]
    fn left_child_is_always_adjacent() {
        let triangles: Vec<Triangle> = (0..100)
            .map(|i| tri_at(Vec3::new((i * 37 % 100) as f32, (i * 61 % 50) as f32, i as f32)))
            .collect();
        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);

        assert_eq!(flat.nodes.len(), root.node_count());
        for (i, node) in flat.nodes.iter().enumerate() {
            if !node.is_leaf() {
                assert_eq!(node.a as usize, i + 1);
                assert!((node.b as usize) < flat.nodes.len());
            }
        }
    }

    #[test]
    fn leaf_encoding_references_reordered_list() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let triangles: Vec<Triangle> = (0..41)
            .map(|_| {
                tri_at(Vec3::new(
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                ))
            })
            .collect();
        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);

        let mut seen = vec![false; flat.triangles.len()];
        for node in &flat.nodes {
            if node.is_leaf() {
                assert_eq!(node.b, -1);
                let t = node.triangle_index();
                assert!(t < flat.triangles.len());
                assert!(!seen[t], "leaf payload {t} referenced twice");
                seen[t] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn reordered_list_is_a_permutation() {
        let triangles: Vec<Triangle> = (0..23)
            .map(|i| tri_at(Vec3::new(i as f32 * 3.0, -(i as f32), (i % 5) as f32)))
            .collect();
        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);

        assert_eq!(flat.triangles.len(), triangles.len());
        // Compare as multisets of centers (triangles are distinct here).
        let key = |t: &Triangle| {
            let c = t.bbox.center();
            (c.x.to_bits(), c.y.to_bits(), c.z.to_bits())
        };
        let mut original: Vec<_> = triangles.iter().map(key).collect();
        let mut permuted: Vec<_> = flat.triangles.iter().map(key).collect();
        original.sort_unstable();
        permuted.sort_unstable();
        assert_eq!(original, permuted);
    }

    #[test]
    fn node_bytes_match_record_stride() {
        let triangles =
            vec![tri_at(Vec3::ZERO), tri_at(Vec3::X * 4.0), tri_at(Vec3::Y * 4.0)];
        let root = build(&triangles).unwrap();
        let flat = flatten(&root, &triangles);
        assert_eq!(flat.node_bytes().len(), flat.nodes.len() * 48);
    }
}
