//! Addressing the triangles of several meshes through one global index.

use crate::aabb::Aabb;
use crate::mesh::Mesh;
use crate::Point3;

/// An ordered list of borrowed meshes. Mesh `i` owns the global triangle indices
/// `offsets[i]..offsets[i + 1]`.
#[derive(Debug)]
pub struct MeshRegistry<'a, M: Mesh + ?Sized> {
    meshes: Vec<&'a M>,
    offsets: Vec<u32>,
    aabb: Aabb,
}

impl<'a, M: Mesh + ?Sized> MeshRegistry<'a, M> {
    pub fn new() -> MeshRegistry<'a, M> {
        MeshRegistry {
            meshes: Vec::new(),
            offsets: vec![0],
            aabb: Aabb::empty(),
        }
    }

    /// Appends `mesh` after all registered meshes. The caller checks that the total
    /// triangle count stays addressable.
    pub fn push(&mut self, mesh: &'a M) {
        let last = self.triangle_count();
        self.offsets.push(last + mesh.triangle_count());
        self.aabb.join_mut(&mesh.bounding_box());
        self.meshes.push(mesh);
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
        self.meshes.shrink_to_fit();
        self.offsets.clear();
        self.offsets.push(0);
        self.offsets.shrink_to_fit();
        self.aabb.reset();
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh(&self, index: usize) -> &'a M {
        self.meshes[index]
    }

    /// Total number of triangles in all meshes.
    pub fn triangle_count(&self) -> u32 {
        self.offsets[self.offsets.len() - 1]
    }

    /// Joint bounds of all meshes.
    pub fn bounding_box(&self) -> Aabb {
        self.aabb
    }

    /// Resolves a global triangle index to `(mesh index, mesh-local triangle index)`.
    #[inline]
    pub fn find_mesh(&self, index: u32) -> (usize, u32) {
        debug_assert!(index < self.triangle_count());
        // Number of offsets <= index, minus the leading zero.
        let mesh_index = self.offsets.partition_point(|&offset| offset <= index) - 1;
        (mesh_index, index - self.offsets[mesh_index])
    }

    /// Bounds of the triangle with global index `index`.
    pub fn triangle_bounding_box(&self, index: u32) -> Aabb {
        let (mesh_index, local) = self.find_mesh(index);
        self.meshes[mesh_index].triangle_bounding_box(local)
    }

    /// Centroid of the triangle with global index `index`.
    pub fn centroid(&self, index: u32) -> Point3 {
        let (mesh_index, local) = self.find_mesh(index);
        self.meshes[mesh_index].centroid(local)
    }
}
