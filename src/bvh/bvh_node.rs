//! The packed node record stored in the [`Bvh`] arena.
//!
//! [`Bvh`]: crate::bvh::Bvh

use crate::aabb::Aabb;
use crate::axis::Axis;

/// Set in [`BvhNode`]'s first word for leaves.
const LEAF_FLAG: u32 = 1 << 31;

/// The low 31 bits of the first word: triangle count of a leaf, split axis of an inner node.
const PAYLOAD_MASK: u32 = !LEAF_FLAG;

/// Largest number of triangles a single leaf can reference.
pub const MAX_LEAF_SIZE: u32 = PAYLOAD_MASK;

/// The decoded variant of a [`BvhNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The triangles `indices[start..start + count]` of the [`Bvh`].
    ///
    /// [`Bvh`]: crate::bvh::Bvh
    Leaf {
        /// First position in the permuted index array.
        start: u32,

        /// Number of triangles.
        count: u32,
    },

    /// An inner node. Its left child directly follows it in the arena.
    Inner {
        /// The axis along which the children were split.
        axis: Axis,

        /// Arena index of the right child.
        right_child: u32,
    },
}

/// A node of the [`Bvh`] arena: a bounding box plus either a leaf range or an inner
/// split, packed into 32 bytes.
///
/// The second half is a tagged pair of words. The highest bit of the first word tells
/// leaves from inner nodes, its remaining 31 bits hold the triangle count or the axis,
/// and the second word holds the start of the leaf range or the right child index.
///
/// [`Bvh`]: crate::bvh::Bvh
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct BvhNode {
    /// Bounds of every triangle below this node.
    pub aabb: Aabb,
    tag: u32,
    data: u32,
}

impl BvhNode {
    /// The size the node record is laid out to occupy.
    pub const PACKED_SIZE: usize = 32;

    /// Creates a leaf node over `indices[start..start + count]`.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::bvh::{BvhNode, NodeKind};
    ///
    /// let node = BvhNode::leaf(Aabb::empty(), 4, 7);
    /// assert!(node.is_leaf());
    /// assert_eq!(node.kind(), NodeKind::Leaf { start: 4, count: 7 });
    /// assert_eq!(node.end(), 11);
    /// ```
    pub fn leaf(aabb: Aabb, start: u32, count: u32) -> BvhNode {
        debug_assert!(count <= MAX_LEAF_SIZE);
        BvhNode {
            aabb,
            tag: LEAF_FLAG | (count & PAYLOAD_MASK),
            data: start,
        }
    }

    /// Creates an inner node whose right child lives at `right_child`.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::axis::Axis;
    /// use mesh_bvh::bvh::{BvhNode, NodeKind};
    ///
    /// let node = BvhNode::inner(Aabb::empty(), Axis::Z, 12);
    /// assert!(!node.is_leaf());
    /// assert_eq!(node.kind(), NodeKind::Inner { axis: Axis::Z, right_child: 12 });
    /// ```
    pub fn inner(aabb: Aabb, axis: Axis, right_child: u32) -> BvhNode {
        BvhNode {
            aabb,
            tag: axis.index() as u32,
            data: right_child,
        }
    }

    /// Decodes the node.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        if self.is_leaf() {
            NodeKind::Leaf {
                start: self.data,
                count: self.tag & PAYLOAD_MASK,
            }
        } else {
            let axis = match self.tag {
                0 => Axis::X,
                1 => Axis::Y,
                _ => Axis::Z,
            };
            NodeKind::Inner {
                axis,
                right_child: self.data,
            }
        }
    }

    /// Returns `true` for leaf nodes.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.tag & LEAF_FLAG != 0
    }

    /// First position of a leaf's range in the index array.
    #[inline]
    pub fn start(&self) -> u32 {
        self.data
    }

    /// One past the last position of a leaf's range in the index array.
    #[inline]
    pub fn end(&self) -> u32 {
        self.data + (self.tag & PAYLOAD_MASK)
    }

    /// Rewrites the right child index of an inner node.
    pub(crate) fn set_right_child(&mut self, right_child: u32) {
        debug_assert!(!self.is_leaf());
        self.data = right_child;
    }
}
