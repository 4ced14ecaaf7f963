//! The [`Mesh`] trait, which is everything a [`Bvh`] needs to know about the geometry it
//! indexes, and [`TriangleMesh`], a plain in-memory implementation of it.
//!
//! [`Bvh`]: crate::bvh::Bvh

use crate::aabb::{Aabb, Bounded};
use crate::ray::{Ray, TriangleHit};
use crate::{Point2, Point3, Vector3};

/// An indexed triangle mesh which can be registered with a [`Bvh`].
///
/// The [`Bvh`] never takes ownership of a mesh. It reads the per-triangle bounds and
/// centroids while building, calls [`Mesh::ray_intersect`] while traversing, and reads
/// the vertex buffers once per query to fill in the [`Intersection`].
///
/// Only the buffer accessors and [`Mesh::bounding_box`] have to be provided.
///
/// # Examples
///
/// ```
/// use mesh_bvh::aabb::Aabb;
/// use mesh_bvh::mesh::Mesh;
/// use mesh_bvh::{Point2, Point3, Vector3};
///
/// struct Quad {
///     positions: [Point3; 4],
///     indices: [[u32; 3]; 2],
/// }
///
/// impl Mesh for Quad {
///     fn positions(&self) -> &[Point3] {
///         &self.positions
///     }
///
///     fn normals(&self) -> Option<&[Vector3]> {
///         None
///     }
///
///     fn tex_coords(&self) -> Option<&[Point2]> {
///         None
///     }
///
///     fn indices(&self) -> &[[u32; 3]] {
///         &self.indices
///     }
///
///     fn bounding_box(&self) -> Aabb {
///         Aabb::with_bounds(self.positions[0], self.positions[2])
///     }
/// }
///
/// let quad = Quad {
///     positions: [
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     indices: [[0, 1, 2], [0, 2, 3]],
/// };
///
/// assert_eq!(quad.triangle_count(), 2);
/// assert_eq!(quad.centroid(0), Point3::new(2.0 / 3.0, 1.0 / 3.0, 0.0));
/// ```
///
/// [`Bvh`]: crate::bvh::Bvh
/// [`Intersection`]: crate::bvh::Intersection
pub trait Mesh: Sync {
    /// Vertex positions.
    fn positions(&self) -> &[Point3];

    /// Per-vertex normals, if the mesh has them.
    fn normals(&self) -> Option<&[Vector3]>;

    /// Per-vertex texture coordinates, if the mesh has them.
    fn tex_coords(&self) -> Option<&[Point2]>;

    /// Vertex indices, three per triangle.
    fn indices(&self) -> &[[u32; 3]];

    /// The bounding box of the whole mesh.
    fn bounding_box(&self) -> Aabb;

    /// Number of triangles in this mesh.
    fn triangle_count(&self) -> u32 {
        u32::try_from(self.indices().len()).unwrap_or(u32::MAX)
    }

    /// The three corners of the triangle `index`.
    fn triangle_vertices(&self, index: u32) -> [Point3; 3] {
        let [a, b, c] = self.indices()[index as usize];
        let positions = self.positions();
        [
            positions[a as usize],
            positions[b as usize],
            positions[c as usize],
        ]
    }

    /// The bounding box of the triangle `index`.
    fn triangle_bounding_box(&self, index: u32) -> Aabb {
        let [a, b, c] = self.triangle_vertices(index);
        Aabb::from_point(a).grow(&b).grow(&c)
    }

    /// The centroid (vertex average) of the triangle `index`.
    fn centroid(&self, index: u32) -> Point3 {
        let [a, b, c] = self.triangle_vertices(index);
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Intersects `ray` with the triangle `index`.
    fn ray_intersect(&self, index: u32, ray: &Ray) -> Option<TriangleHit> {
        let [a, b, c] = self.triangle_vertices(index);
        ray.intersects_triangle(&a, &b, &c)
    }
}

/// A triangle mesh held in memory.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    positions: Vec<Point3>,
    normals: Option<Vec<Vector3>>,
    tex_coords: Option<Vec<Point2>>,
    indices: Vec<[u32; 3]>,
    aabb: Aabb,
}

impl TriangleMesh {
    /// Creates a [`TriangleMesh`] from vertex positions and index triples. Every index
    /// must address an element of `positions`.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::mesh::{Mesh, TriangleMesh};
    /// use mesh_bvh::Point3;
    ///
    /// let mesh = TriangleMesh::new(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(2.0, 0.0, 0.0),
    ///         Point3::new(0.0, 2.0, 1.0),
    ///     ],
    ///     vec![[0, 1, 2]],
    /// );
    ///
    /// assert_eq!(mesh.triangle_count(), 1);
    /// assert_eq!(mesh.bounding_box().max, Point3::new(2.0, 2.0, 1.0));
    /// ```
    pub fn new(positions: Vec<Point3>, indices: Vec<[u32; 3]>) -> TriangleMesh {
        let mut aabb = Aabb::empty();
        for position in &positions {
            aabb.grow_mut(position);
        }

        TriangleMesh {
            positions,
            normals: None,
            tex_coords: None,
            indices,
            aabb,
        }
    }

    /// Attaches per-vertex normals, one for each position.
    pub fn with_normals(mut self, normals: Vec<Vector3>) -> TriangleMesh {
        debug_assert_eq!(normals.len(), self.positions.len());
        self.normals = Some(normals);
        self
    }

    /// Attaches per-vertex texture coordinates, one for each position.
    pub fn with_tex_coords(mut self, tex_coords: Vec<Point2>) -> TriangleMesh {
        debug_assert_eq!(tex_coords.len(), self.positions.len());
        self.tex_coords = Some(tex_coords);
        self
    }
}

impl Mesh for TriangleMesh {
    fn positions(&self) -> &[Point3] {
        &self.positions
    }

    fn normals(&self) -> Option<&[Vector3]> {
        self.normals.as_deref()
    }

    fn tex_coords(&self) -> Option<&[Point2]> {
        self.tex_coords.as_deref()
    }

    fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    fn bounding_box(&self) -> Aabb {
        self.aabb
    }
}

impl Bounded for TriangleMesh {
    fn aabb(&self) -> Aabb {
        self.aabb
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::mesh::{Mesh, TriangleMesh};
    use crate::ray::Ray;
    use crate::testbase::{create_n_cubes, default_bounds};
    use crate::{Point2, Point3, Vector3};
    use float_eq::assert_float_eq;

    fn two_triangles() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(0.0, 3.0, 0.0),
                Point3::new(0.0, 0.0, 6.0),
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        )
    }

    #[test]
    fn test_triangle_queries() {
        let mesh = two_triangles();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.centroid(0), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.centroid(1), Point3::new(1.0, 0.0, 2.0));

        let aabb = mesh.triangle_bounding_box(1);
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(3.0, 0.0, 6.0));

        assert_eq!(mesh.triangle_vertices(0)[2], Point3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_mesh_bounding_box_contains_all_triangles() {
        let mesh = create_n_cubes(20, &default_bounds());
        let aabb = mesh.bounding_box();
        assert_eq!(aabb, mesh.aabb());
        for i in 0..mesh.triangle_count() {
            assert!(aabb.contains_aabb(&mesh.triangle_bounding_box(i)));
        }
    }

    #[test]
    fn test_ray_intersect_uses_local_index() {
        let mesh = two_triangles();
        let ray = Ray::new(Point3::new(0.5, 0.5, 4.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = mesh.ray_intersect(0, &ray).unwrap();
        assert_float_eq!(hit.t, 4.0, abs <= 1e-5);
        assert!(mesh.ray_intersect(1, &ray).is_none());
    }

    #[test]
    fn test_optional_attributes() {
        let mesh = two_triangles();
        assert!(mesh.normals().is_none());
        assert!(mesh.tex_coords().is_none());

        let mesh = mesh
            .with_normals(vec![Vector3::z(); 4])
            .with_tex_coords(vec![Point2::new(0.0, 0.0); 4]);
        assert_eq!(mesh.normals().map(<[_]>::len), Some(4));
        assert_eq!(mesh.tex_coords().map(<[_]>::len), Some(4));
    }
}
