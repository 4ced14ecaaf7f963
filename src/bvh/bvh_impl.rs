//! This module defines [`Bvh`]: the mesh registry, the node arena and the permuted
//! index array, and the operations that fill and inspect them.

use std::mem::size_of;
use std::time::Instant;

use log::{debug, info};

use crate::aabb::Aabb;
use crate::bvh::build::{build_arena, Primitives, INTERSECTION_COST, TRAVERSAL_COST};
use crate::bvh::bvh_node::MAX_LEAF_SIZE;
use crate::bvh::compact::compact;
use crate::bvh::registry::MeshRegistry;
use crate::bvh::{BvhNode, NodeKind};
use crate::error::BvhError;
use crate::mesh::Mesh;
use crate::utils::mem_string;
use crate::Real;

/// Largest number of triangles a single [`Bvh`] can index.
pub const MAX_TRIANGLES: u32 = MAX_LEAF_SIZE;

/// A bounding volume hierarchy over the triangles of several meshes.
///
/// A [`Bvh`] goes through two phases. Meshes are registered with [`Bvh::add_mesh`],
/// then [`Bvh::build`] sorts their triangles into a tree. After that the tree is
/// immutable and can be queried from any number of threads with [`Bvh::ray_intersect`]
/// and [`Bvh::ray_occluded`]. [`Bvh::clear`] returns to the registration phase.
///
/// The meshes are borrowed, not owned. Mixing mesh types works with `Bvh<dyn Mesh>`.
///
/// # Examples
/// ```
/// use mesh_bvh::bvh::Bvh;
/// use mesh_bvh::mesh::{Mesh, TriangleMesh};
/// use mesh_bvh::ray::Ray;
/// use mesh_bvh::{Point3, Vector3};
///
/// let floor = TriangleMesh::new(
///     vec![
///         Point3::new(-10.0, 0.0, -10.0),
///         Point3::new(10.0, 0.0, -10.0),
///         Point3::new(10.0, 0.0, 10.0),
///         Point3::new(-10.0, 0.0, 10.0),
///     ],
///     vec![[0, 1, 2], [0, 2, 3]],
/// );
///
/// let mut bvh: Bvh<dyn Mesh> = Bvh::new();
/// bvh.add_mesh(&floor).unwrap();
/// bvh.build().unwrap();
/// assert_eq!(bvh.triangle_count(), 2);
///
/// let down = Ray::new(Point3::new(1.0, 5.0, 2.0), Vector3::new(0.0, -1.0, 0.0));
/// assert!((bvh.ray_intersect(&down).unwrap().t - 5.0).abs() < 1e-4);
///
/// let up = Ray::new(Point3::new(1.0, 5.0, 2.0), Vector3::new(0.0, 1.0, 0.0));
/// assert!(!bvh.ray_occluded(&up));
/// ```
pub struct Bvh<'a, M: Mesh + ?Sized> {
    pub(super) registry: MeshRegistry<'a, M>,

    /// The compacted node arena. The root is at index 0.
    pub(super) nodes: Vec<BvhNode>,

    /// Global triangle indices, permuted so that every leaf covers a contiguous range.
    pub(super) indices: Vec<u32>,

    built: bool,
}

impl<'a, M: Mesh + ?Sized> Default for Bvh<'a, M> {
    fn default() -> Self {
        Bvh::new()
    }
}

impl<'a, M: Mesh + ?Sized> Bvh<'a, M> {
    /// Creates an empty [`Bvh`] in the registration phase.
    pub fn new() -> Bvh<'a, M> {
        Bvh {
            registry: MeshRegistry::new(),
            nodes: Vec::new(),
            indices: Vec::new(),
            built: false,
        }
    }

    /// Registers `mesh`. Its triangles follow those of all previously added meshes in
    /// the global triangle numbering.
    ///
    /// Fails with [`BvhError::MeshAfterBuild`] once [`Bvh::build`] was called, and with
    /// [`BvhError::TooManyTriangles`] if the scene would exceed [`MAX_TRIANGLES`].
    pub fn add_mesh(&mut self, mesh: &'a M) -> Result<(), BvhError> {
        if self.built {
            return Err(BvhError::MeshAfterBuild);
        }

        let count = self.registry.triangle_count() as u64 + mesh.triangle_count() as u64;
        if count > MAX_TRIANGLES as u64 {
            return Err(BvhError::TooManyTriangles {
                count,
                max: MAX_TRIANGLES as u64,
            });
        }

        self.registry.push(mesh);
        Ok(())
    }

    /// Builds the tree over all registered triangles.
    ///
    /// Building an empty scene succeeds and leaves the tree empty, so that every query
    /// misses. Calling `build` again rebuilds the tree from scratch.
    pub fn build(&mut self) -> Result<(), BvhError> {
        let actual = size_of::<BvhNode>();
        if actual != BvhNode::PACKED_SIZE {
            return Err(BvhError::NodeLayout {
                expected: BvhNode::PACKED_SIZE,
                actual,
            });
        }

        self.built = true;
        self.nodes.clear();
        self.indices.clear();

        let size = self.registry.triangle_count();
        if size == 0 {
            debug!("Skipping BVH construction for an empty scene");
            return Ok(());
        }

        let mesh_count = self.registry.mesh_count();
        debug!(
            "Constructing a SAH BVH ({} {}, {} triangles)",
            mesh_count,
            if mesh_count == 1 { "mesh" } else { "meshes" },
            size
        );
        let timer = Instant::now();

        let primitives = Primitives::gather(&self.registry);
        let (arena, indices) = build_arena(&primitives, self.registry.bounding_box());
        let memory = size_of::<BvhNode>() * arena.len() + size_of::<u32>() * indices.len();

        // The arena was allocated for the worst case and is mostly empty.
        self.nodes = compact(&arena);
        self.indices = indices;

        let (sah_cost, node_count) = self.statistics();
        debug_assert_eq!(node_count as usize, self.nodes.len());

        info!(
            "Constructed a SAH BVH ({} {}, {} triangles, {} nodes) in {:?} using {}, SAH cost = {}",
            mesh_count,
            if mesh_count == 1 { "mesh" } else { "meshes" },
            size,
            node_count,
            timer.elapsed(),
            mem_string(memory),
            sah_cost
        );
        Ok(())
    }

    /// Drops the tree and all registered meshes and returns to the registration phase.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.nodes = Vec::new();
        self.indices = Vec::new();
        self.built = false;
    }

    /// Returns `true` once [`Bvh::build`] was called.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of registered meshes.
    pub fn mesh_count(&self) -> usize {
        self.registry.mesh_count()
    }

    /// The mesh registered `index`-th.
    ///
    /// # Panics
    /// Panics if `index >= self.mesh_count()`.
    pub fn mesh(&self, index: usize) -> &'a M {
        self.registry.mesh(index)
    }

    /// Total number of triangles in all registered meshes.
    pub fn triangle_count(&self) -> u32 {
        self.registry.triangle_count()
    }

    /// Joint bounds of all registered meshes.
    pub fn bounding_box(&self) -> Aabb {
        self.registry.bounding_box()
    }

    /// The node arena. Empty before [`Bvh::build`] and for empty scenes.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// The permuted global triangle indices the leaves refer to.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the expected cost of a ray query under the surface area heuristic and
    /// the number of nodes in the tree, or `(0.0, 0)` for an empty tree.
    pub fn statistics(&self) -> (Real, u32) {
        if self.nodes.is_empty() {
            (0.0, 0)
        } else {
            self.node_statistics(0)
        }
    }

    fn node_statistics(&self, index: usize) -> (Real, u32) {
        let node = &self.nodes[index];
        match node.kind() {
            NodeKind::Leaf { count, .. } => (INTERSECTION_COST * count as Real, 1),
            NodeKind::Inner { right_child, .. } => {
                let left = index + 1;
                let right = right_child as usize;
                let (cost_left, count_left) = self.node_statistics(left);
                let (cost_right, count_right) = self.node_statistics(right);

                let sa_left = self.nodes[left].aabb.surface_area();
                let sa_right = self.nodes[right].aabb.surface_area();
                let sa = node.aabb.surface_area();
                let sah_cost =
                    2.0 * TRAVERSAL_COST + (sa_left * cost_left + sa_right * cost_right) / sa;
                (sah_cost, count_left + count_right + 1)
            }
        }
    }
}
