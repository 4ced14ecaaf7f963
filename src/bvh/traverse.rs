//! Stack based ray traversal of a finished [`Bvh`].

use std::fmt;

use crate::bvh::{Bvh, NodeKind};
use crate::frame::Frame;
use crate::mesh::Mesh;
use crate::ray::{Ray, TriangleHit};
use crate::{Point2, Point3, Real, Vector3};

/// Capacity of the traversal stack. Deeper trees are an invariant violation.
pub const STACK_SIZE: usize = 64;

/// The nearest surface point found along a ray.
pub struct Intersection<'a, M: Mesh + ?Sized> {
    /// Distance along the ray, in multiples of its direction.
    pub t: Real,

    /// Interpolated texture coordinates, or the barycentric `(u, v)` of the hit if the
    /// mesh has none.
    pub uv: Point2,

    /// The hit position, interpolated from the triangle's vertices.
    pub p: Point3,

    /// Frame around the triangle's face normal.
    pub geo_frame: Frame,

    /// Frame around the interpolated vertex normal, or [`Intersection::geo_frame`] if
    /// the mesh has no normals.
    pub sh_frame: Frame,

    /// The mesh that was hit.
    pub mesh: &'a M,

    /// Registration index of [`Intersection::mesh`].
    pub mesh_index: usize,

    /// The triangle that was hit, local to [`Intersection::mesh`].
    pub triangle_index: u32,
}

impl<'a, M: Mesh + ?Sized> Clone for Intersection<'a, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M: Mesh + ?Sized> Copy for Intersection<'a, M> {}

impl<'a, M: Mesh + ?Sized> fmt::Debug for Intersection<'a, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intersection")
            .field("t", &self.t)
            .field("uv", &self.uv)
            .field("p", &self.p)
            .field("geo_frame", &self.geo_frame)
            .field("sh_frame", &self.sh_frame)
            .field("mesh_index", &self.mesh_index)
            .field("triangle_index", &self.triangle_index)
            .finish()
    }
}

impl<'a, M: Mesh + ?Sized> Intersection<'a, M> {
    /// Fills in the surface data for `hit` on triangle `triangle_index` of `mesh`.
    fn new(mesh: &'a M, mesh_index: usize, triangle_index: u32, hit: TriangleHit) -> Self {
        let bary = Vector3::new(1.0 - hit.u - hit.v, hit.u, hit.v);

        let [i0, i1, i2] = mesh.indices()[triangle_index as usize];
        let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);

        let positions = mesh.positions();
        let (p0, p1, p2) = (positions[i0], positions[i1], positions[i2]);
        let p = Point3::from(p0.coords * bary.x + p1.coords * bary.y + p2.coords * bary.z);

        let uv = match mesh.tex_coords() {
            Some(uv) => Point2::from(
                uv[i0].coords * bary.x + uv[i1].coords * bary.y + uv[i2].coords * bary.z,
            ),
            None => Point2::new(hit.u, hit.v),
        };

        let geo_frame = Frame::from_normal((p1 - p0).cross(&(p2 - p0)).normalize());

        // Tangents are not continuous across triangles.
        let sh_frame = match mesh.normals() {
            Some(n) => {
                Frame::from_normal((n[i0] * bary.x + n[i1] * bary.y + n[i2] * bary.z).normalize())
            }
            None => geo_frame,
        };

        Intersection {
            t: hit.t,
            uv,
            p,
            geo_frame,
            sh_frame,
            mesh,
            mesh_index,
            triangle_index,
        }
    }
}

impl<'a, M: Mesh + ?Sized> Bvh<'a, M> {
    /// Finds the nearest intersection of `ray` with any registered triangle.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::bvh::Bvh;
    /// use mesh_bvh::mesh::TriangleMesh;
    /// use mesh_bvh::ray::Ray;
    /// use mesh_bvh::{Point3, Vector3};
    ///
    /// let mesh = TriangleMesh::new(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     vec![[0, 1, 2]],
    /// );
    /// let mut bvh = Bvh::new();
    /// bvh.add_mesh(&mesh).unwrap();
    /// bvh.build().unwrap();
    ///
    /// let ray = Ray::new(Point3::new(0.25, 0.25, -2.0), Vector3::new(0.0, 0.0, 1.0));
    /// let its = bvh.ray_intersect(&ray).unwrap();
    /// assert!((its.p - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-5);
    /// assert_eq!(its.triangle_index, 0);
    /// ```
    pub fn ray_intersect(&self, ray: &Ray) -> Option<Intersection<'a, M>> {
        self.traverse(ray, false).map(|(mesh_index, triangle_index, hit)| {
            Intersection::new(self.registry.mesh(mesh_index), mesh_index, triangle_index, hit)
        })
    }

    /// Returns `true` if `ray` hits any registered triangle. Stops at the first hit found.
    pub fn ray_occluded(&self, ray: &Ray) -> bool {
        self.traverse(ray, true).is_some()
    }

    /// Walks the tree and returns `(mesh index, local triangle index, hit)` of the
    /// nearest hit, or of the first hit found if `shadow_ray` is set.
    fn traverse(&self, ray: &Ray, shadow_ray: bool) -> Option<(usize, u32, TriangleHit)> {
        let mut ray = *ray;
        ray.adapt_epsilon();

        if self.nodes.is_empty() || ray.max_t < ray.min_t {
            return None;
        }

        let mut stack = [0u32; STACK_SIZE];
        let mut stack_len = 0;
        let mut node_index = 0;
        let mut closest = None;

        loop {
            let node = &self.nodes[node_index];

            if node.aabb.ray_intersect(&ray) {
                match node.kind() {
                    NodeKind::Inner { right_child, .. } => {
                        debug_assert!(stack_len < STACK_SIZE, "BVH traversal stack overflow");
                        stack[stack_len] = right_child;
                        stack_len += 1;
                        node_index += 1;
                        continue;
                    }
                    NodeKind::Leaf { start, count } => {
                        let range = start as usize..(start + count) as usize;
                        for &index in &self.indices[range] {
                            let (mesh_index, local) = self.registry.find_mesh(index);
                            let mesh = self.registry.mesh(mesh_index);
                            if let Some(hit) = mesh.ray_intersect(local, &ray) {
                                if shadow_ray {
                                    return Some((mesh_index, local, hit));
                                }
                                ray.max_t = hit.t;
                                closest = Some((mesh_index, local, hit));
                            }
                        }
                    }
                }
            }

            if stack_len == 0 {
                break;
            }
            stack_len -= 1;
            node_index = stack[stack_len] as usize;
        }

        closest
    }
}
