//! Parallel construction of the node arena with the Surface Area Heuristic.
//!
//! The approach is the binned build described in "Fast and Parallel Construction of
//! SAH-based Bounding Volume Hierarchies" (Wald, 2007). Large ranges are split with
//! 16 bins along the largest axis of the node; small ranges, and ranges for which
//! binning finds nothing better than a leaf, are handled by an exact sweep over all
//! three axes.
//!
//! Every node covering `c` triangles owns the `2c - 1` arena slots starting at its own
//! index: its left child covering `l` triangles follows it directly and its right
//! child starts `2l` slots after it. Tasks therefore only ever touch their own
//! sub-slices of the arena, the index array and the scratch buffer.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};

use log::trace;

use crate::aabb::Aabb;
use crate::axis::Axis;
use crate::bvh::bucket::{bin_index, Bins, BIN_COUNT};
use crate::bvh::registry::MeshRegistry;
use crate::bvh::BvhNode;
use crate::mesh::Mesh;
use crate::utils::{collect_range, for_each_chunk, join, map_reduce_chunks};
use crate::{Point3, Real, EPSILON};

/// Ranges with fewer triangles are built by the exact serial sweep.
pub const SERIAL_THRESHOLD: usize = 32;

/// Number of triangles binned or partitioned by one parallel work item.
pub const GRAIN_SIZE: usize = 1000;

/// Heuristic cost of visiting a node.
pub const TRAVERSAL_COST: Real = 1.0;

/// Heuristic cost of testing a triangle.
pub const INTERSECTION_COST: Real = 1.0;

thread_local! {
    /// Thread local prefix areas for the serial sweep to reduce allocations during build
    static LEFT_AREAS: RefCell<Vec<Real>> = RefCell::new(Vec::new());
}

fn with_left_areas<R>(size: usize, closure: impl FnOnce(&mut [Real]) -> R) -> R {
    LEFT_AREAS.with(move |areas| {
        let mut areas = areas.borrow_mut();
        if areas.len() < size {
            areas.resize(size, 0.0);
        }
        closure(&mut areas[..size])
    })
}

/// Bounds and centroids of all triangles, addressed by global triangle index.
pub(crate) struct Primitives {
    pub aabbs: Vec<Aabb>,
    pub centroids: Vec<Point3>,
}

impl Primitives {
    /// Queries every registered mesh once for its triangles' bounds and centroids.
    pub fn gather<M: Mesh + ?Sized>(registry: &MeshRegistry<M>) -> Primitives {
        let count = registry.triangle_count();
        Primitives {
            aabbs: collect_range(count, |i| registry.triangle_bounding_box(i)),
            centroids: collect_range(count, |i| registry.centroid(i)),
        }
    }

    pub fn len(&self) -> usize {
        self.aabbs.len()
    }

    #[inline]
    fn centroid(&self, index: u32, axis: Axis) -> Real {
        self.centroids[index as usize][axis]
    }

    #[inline]
    fn aabb(&self, index: u32) -> &Aabb {
        &self.aabbs[index as usize]
    }

    fn sort_by_centroid(&self, indices: &mut [u32], axis: Axis) {
        indices.sort_unstable_by(|&a, &b| {
            self.centroid(a, axis)
                .total_cmp(&self.centroid(b, axis))
        });
    }
}

/// Builds the conservatively sized node arena over all `primitives`, which must not be
/// empty. Returns the arena, with `None` marking unused slots, and the permuted index
/// array the leaves point into. `aabb` has to contain every triangle.
pub(crate) fn build_arena(
    primitives: &Primitives,
    aabb: Aabb,
) -> (Vec<Option<BvhNode>>, Vec<u32>) {
    let size = primitives.len();
    debug_assert!(size > 0);

    let mut nodes = vec![None; 2 * size];
    let mut indices: Vec<u32> = (0..size as u32).collect();
    let scratch: Vec<AtomicU32> = (0..size).map(|_| AtomicU32::new(0)).collect();

    BuildTask {
        primitives,
        nodes: &mut nodes[..2 * size - 1],
        indices: &mut indices,
        scratch: &scratch,
        node_index: 0,
        offset: 0,
        aabb,
    }
    .execute();

    (nodes, indices)
}

/// The work of building one subtree.
struct BuildTask<'a> {
    primitives: &'a Primitives,

    /// The `2 * indices.len() - 1` arena slots owned by this subtree.
    nodes: &'a mut [Option<BvhNode>],

    /// The triangles of this subtree.
    indices: &'a mut [u32],

    /// Partition target, as long as `indices`.
    scratch: &'a [AtomicU32],

    /// Arena index of `nodes[0]`.
    node_index: u32,

    /// Position of `indices[0]` in the whole index array.
    offset: u32,

    /// Bounds of the triangles in `indices`. Only used by the binned path; the serial
    /// sweep computes its own.
    aabb: Aabb,
}

impl<'a> BuildTask<'a> {
    fn execute(self) {
        let size = self.indices.len();
        debug_assert_eq!(self.nodes.len(), 2 * size - 1);
        debug_assert_eq!(self.scratch.len(), size);

        if size < SERIAL_THRESHOLD {
            return self.execute_serially();
        }

        let BuildTask {
            primitives,
            nodes,
            indices,
            scratch,
            node_index,
            offset,
            aabb,
        } = self;

        // Always split along the largest axis.
        let axis = aabb.largest_axis();
        let min = aabb.min[axis];
        let extent = aabb.max[axis] - min;

        // Negated so that NaN extents end up here as well.
        if !(extent >= EPSILON) {
            trace!(
                "Degenerate extent {} along {} for {} triangles, making a leaf",
                extent,
                axis,
                size
            );
            nodes[0] = Some(BvhNode::leaf(aabb, offset, size as u32));
            return;
        }

        let inv_bin_size = BIN_COUNT as Real / extent;
        let bins = map_reduce_chunks(
            indices,
            GRAIN_SIZE,
            Bins::empty,
            |chunk| {
                let mut bins = Bins::empty();
                for &index in chunk {
                    let bin = bin_index(primitives.centroid(index, axis), min, inv_bin_size);
                    bins.add(bin, primitives.aabb(index));
                }
                bins
            },
            Bins::merge,
        );
        debug_assert_eq!(bins.total() as usize, size);

        // Prefix counts and bounds of everything left of each bin boundary.
        let mut left_counts = bins.counts;
        let mut left_aabbs = bins.aabbs;
        for i in 1..BIN_COUNT {
            left_counts[i] += left_counts[i - 1];
            left_aabbs[i] = left_aabbs[i - 1].join(&bins.aabbs[i]);
        }

        let mut right_aabb = bins.aabbs[BIN_COUNT - 1];
        let mut best_right_aabb = Aabb::empty();
        let mut best_index = None;
        let mut best_cost = INTERSECTION_COST * size as Real;
        let tri_factor = INTERSECTION_COST / aabb.surface_area();

        for i in (0..BIN_COUNT - 1).rev() {
            let prims_left = left_counts[i];
            let prims_right = size as u32 - prims_left;
            if prims_left > 0 && prims_right > 0 {
                let sah_cost = 2.0 * TRAVERSAL_COST
                    + tri_factor
                        * (prims_left as Real * left_aabbs[i].surface_area()
                            + prims_right as Real * right_aabb.surface_area());
                if sah_cost < best_cost {
                    best_cost = sah_cost;
                    best_index = Some(i);
                    best_right_aabb = right_aabb;
                }
            }
            right_aabb.join_mut(&bins.aabbs[i]);
        }

        let best_index = match best_index {
            Some(index) => index,
            None => {
                trace!(
                    "Binning found no split for {} triangles, retrying serially",
                    size
                );
                return BuildTask {
                    primitives,
                    nodes,
                    indices,
                    scratch,
                    node_index,
                    offset,
                    aabb,
                }
                .execute_serially();
            }
        };

        let left_count = left_counts[best_index] as usize;
        let goes_left = |index: u32| {
            bin_index(primitives.centroid(index, axis), min, inv_bin_size) <= best_index
        };

        // Every chunk reserves disjoint output ranges for its left and right triangles.
        let offset_left = AtomicU32::new(0);
        let offset_right = AtomicU32::new(left_count as u32);
        for_each_chunk(indices, GRAIN_SIZE, |chunk| {
            let count_left = chunk.iter().filter(|&&index| goes_left(index)).count() as u32;
            let count_right = chunk.len() as u32 - count_left;

            let mut idx_l = offset_left.fetch_add(count_left, Ordering::Relaxed) as usize;
            let mut idx_r = offset_right.fetch_add(count_right, Ordering::Relaxed) as usize;
            for &index in chunk {
                if goes_left(index) {
                    scratch[idx_l].store(index, Ordering::Relaxed);
                    idx_l += 1;
                } else {
                    scratch[idx_r].store(index, Ordering::Relaxed);
                    idx_r += 1;
                }
            }
        });
        debug_assert_eq!(offset_left.into_inner() as usize, left_count);
        debug_assert_eq!(offset_right.into_inner() as usize, size);

        for (index, slot) in indices.iter_mut().zip(scratch) {
            *index = slot.load(Ordering::Relaxed);
        }

        let right_index = node_index + 2 * left_count as u32;
        let (node, rest) = nodes.split_at_mut(1);
        node[0] = Some(BvhNode::inner(aabb, axis, right_index));

        let (left_nodes, right_nodes) = rest.split_at_mut(2 * left_count - 1);
        let (left_indices, right_indices) = indices.split_at_mut(left_count);
        let (left_scratch, right_scratch) = scratch.split_at(left_count);

        let left = BuildTask {
            primitives,
            nodes: left_nodes,
            indices: left_indices,
            scratch: left_scratch,
            node_index: node_index + 1,
            offset,
            aabb: left_aabbs[best_index],
        };
        let right = BuildTask {
            primitives,
            nodes: right_nodes,
            indices: right_indices,
            scratch: right_scratch,
            node_index: right_index,
            offset: offset + left_count as u32,
            aabb: best_right_aabb,
        };

        // The right subtree may be picked up by another worker while this one goes left.
        join(move || left.execute(), move || right.execute());
    }

    /// Tries every split position along every axis and picks the cheapest one, or makes
    /// a leaf if no split beats intersecting all triangles.
    fn execute_serially(self) {
        let BuildTask {
            primitives,
            nodes,
            indices,
            scratch,
            node_index,
            offset,
            ..
        } = self;
        let size = indices.len();

        let mut node_aabb = Aabb::empty();
        let mut best_cost = INTERSECTION_COST * size as Real;
        let mut best = None;

        with_left_areas(size, |left_areas| {
            for axis in Axis::ALL {
                primitives.sort_by_centroid(indices, axis);

                let mut aabb = Aabb::empty();
                for (area, &index) in left_areas.iter_mut().zip(indices.iter()) {
                    aabb.join_mut(primitives.aabb(index));
                    *area = aabb.surface_area();
                }
                if axis == Axis::X {
                    node_aabb = aabb;
                }
                aabb.reset();

                let tri_factor = INTERSECTION_COST / node_aabb.surface_area();
                for i in (1..size).rev() {
                    aabb.join_mut(primitives.aabb(indices[i]));
                    let left_area = left_areas[i - 1];
                    let right_area = aabb.surface_area();
                    let prims_left = i as Real;
                    let prims_right = (size - i) as Real;
                    let sah_cost = 2.0 * TRAVERSAL_COST
                        + tri_factor * (prims_left * left_area + prims_right * right_area);
                    if sah_cost < best_cost {
                        best_cost = sah_cost;
                        best = Some((axis, i));
                    }
                }
            }
        });

        let (axis, left_count) = match best {
            Some(best) => best,
            None => {
                // Splitting does not reduce the cost.
                nodes[0] = Some(BvhNode::leaf(node_aabb, offset, size as u32));
                return;
            }
        };

        primitives.sort_by_centroid(indices, axis);

        let right_index = node_index + 2 * left_count as u32;
        let (node, rest) = nodes.split_at_mut(1);
        node[0] = Some(BvhNode::inner(node_aabb, axis, right_index));

        let (left_nodes, right_nodes) = rest.split_at_mut(2 * left_count - 1);
        let (left_indices, right_indices) = indices.split_at_mut(left_count);
        let (left_scratch, right_scratch) = scratch.split_at(left_count);

        BuildTask {
            primitives,
            nodes: left_nodes,
            indices: left_indices,
            scratch: left_scratch,
            node_index: node_index + 1,
            offset,
            aabb: Aabb::empty(),
        }
        .execute_serially();
        BuildTask {
            primitives,
            nodes: right_nodes,
            indices: right_indices,
            scratch: right_scratch,
            node_index: right_index,
            offset: offset + left_count as u32,
            aabb: Aabb::empty(),
        }
        .execute_serially();
    }
}
