//! Top-down recursive BVH construction.

use crate::error::LumoError;
use crate::geometry::{Aabb, Triangle};

/// A node of the hierarchy. The tree is full: an internal node always has
/// exactly two children.
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    /// Interior node covering both subtrees.
    Internal {
        /// Left subtree.
        left: Box<BvhNode>,
        /// Right subtree.
        right: Box<BvhNode>,
        /// Union of the children's boxes.
        bbox: Aabb,
    },
    /// Terminal node referencing one triangle of the input list.
    Leaf {
        /// Index into the triangle list the tree was built over.
        triangle: usize,
        /// The triangle's cached box.
        bbox: Aabb,
    },
}

impl BvhNode {
    /// This node's bounding box.
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        match self {
            Self::Internal { bbox, .. } | Self::Leaf { bbox, .. } => *bbox,
        }
    }

    /// Total number of nodes in the subtree rooted here.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Internal { left, right, .. } => {
                1 + left.node_count() + right.node_count()
            }
            Self::Leaf { .. } => 1,
        }
    }

    /// Number of leaves in the subtree rooted here.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Internal { left, right, .. } => {
                left.leaf_count() + right.leaf_count()
            }
            Self::Leaf { .. } => 1,
        }
    }
}

/// Build a BVH over `triangles`.
///
/// Splits ranges at the median along the longest axis of the parent box,
/// so the same input always yields the same tree.
///
/// # Errors
///
/// [`LumoError::EmptyScene`] when `triangles` is empty;
/// [`LumoError::DegenerateGeometry`] when any triangle has a non-finite
/// vertex component.
pub fn build(triangles: &[Triangle]) -> Result<BvhNode, LumoError> {
    if triangles.is_empty() {
        return Err(LumoError::EmptyScene);
    }
    if let Some(index) = triangles.iter().position(|t| !t.is_finite()) {
        return Err(LumoError::DegenerateGeometry { index });
    }

    let mut order: Vec<usize> = (0..triangles.len()).collect();
    Ok(build_range(triangles, &mut order))
}

/// Recursive worker over a sub-range of the index scratch list.
fn build_range(triangles: &[Triangle], order: &mut [usize]) -> BvhNode {
    let bbox = range_bbox(triangles, order);
    let axis = bbox.longest_axis();

    match order.len() {
        1 => BvhNode::Leaf {
            triangle: order[0],
            bbox: triangles[order[0]].bbox,
        },
        2 => {
            // Two triangles: the smaller center on the split axis goes left.
            let (first, second) = if center(triangles, order[0], axis)
                <= center(triangles, order[1], axis)
            {
                (order[0], order[1])
            } else {
                (order[1], order[0])
            };
            BvhNode::Internal {
                left: Box::new(BvhNode::Leaf {
                    triangle: first,
                    bbox: triangles[first].bbox,
                }),
                right: Box::new(BvhNode::Leaf {
                    triangle: second,
                    bbox: triangles[second].bbox,
                }),
                bbox,
            }
        }
        _ => {
            order.sort_by(|&a, &b| {
                center(triangles, a, axis).total_cmp(&center(triangles, b, axis))
            });
            let mid = order.len() / 2;
            let (lo, hi) = order.split_at_mut(mid);
            let left = build_range(triangles, lo);
            let right = build_range(triangles, hi);
            BvhNode::Internal {
                left: Box::new(left),
                right: Box::new(right),
                bbox,
            }
        }
    }
}

fn range_bbox(triangles: &[Triangle], order: &[usize]) -> Aabb {
    let mut bbox = triangles[order[0]].bbox;
    for &index in &order[1..] {
        bbox = Aabb::surround(bbox, triangles[index].bbox);
    }
    bbox
}

fn center(triangles: &[Triangle], index: usize, axis: usize) -> f32 {
    triangles[index].bbox.center()[axis]
}
