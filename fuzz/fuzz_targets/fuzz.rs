#![no_main]
use std::fmt::{self, Debug, Formatter};

use approx::assert_relative_eq;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mesh_bvh::bvh::Bvh;
use mesh_bvh::mesh::{Mesh, TriangleMesh};
use mesh_bvh::ray::Ray;
use mesh_bvh::{Point3, Real};
use ordered_float::NotNan;

const LIMIT: Real = 1_000_000.0;

fuzz_target!(|workload: Workload| {
    workload.fuzz();
});

#[derive(Arbitrary)]
struct ArbitraryPoint {
    coordinates: [NotNan<Real>; 3],
}

impl ArbitraryPoint {
    fn point(&self) -> Point3 {
        nalgebra::Point3::from_slice(&self.coordinates).map(|f| f.into_inner().clamp(-LIMIT, LIMIT))
    }
}

#[derive(Debug, Arbitrary)]
struct ArbitraryTriangle {
    vertices: [ArbitraryPoint; 3],
}

impl Debug for ArbitraryPoint {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.point(), f)
    }
}

#[derive(Arbitrary)]
struct ArbitraryRay {
    origin: ArbitraryPoint,
    destination: ArbitraryPoint,
    max_t: Option<NotNan<Real>>,
}

impl Debug for ArbitraryRay {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.ray(), f)
    }
}

impl ArbitraryRay {
    fn ray(&self) -> Ray {
        // Double normalize helps when the first one encounters precision issues.
        let mut direction = (self.destination.point() - self.origin.point())
            .normalize()
            .normalize();
        // Ensure no degenerate direction.
        if direction.magnitude() < 0.5 || direction.iter().any(|f| f.is_nan() || f.abs() > 1.5) {
            direction.iter_mut().for_each(|f| *f = 1.0);
            direction = direction.normalize();
        }
        let mut ray = Ray::new(self.origin.point(), direction);
        if let Some(max_t) = self.max_t {
            ray.max_t = max_t.into_inner().abs();
        }
        ray
    }
}

#[derive(Debug, Arbitrary)]
struct Workload {
    /// Triangles, distributed over meshes at the given split points.
    triangles: Vec<ArbitraryTriangle>,
    splits: Vec<u8>,
    ray: ArbitraryRay,
}

impl Workload {
    fn meshes(&self) -> Vec<TriangleMesh> {
        let mut meshes = Vec::new();
        let mut rest = &self.triangles[..];
        for &split in self.splits.iter().take(8) {
            let (head, tail) = rest.split_at((split as usize).min(rest.len()));
            meshes.push(Self::mesh(head));
            rest = tail;
        }
        meshes.push(Self::mesh(rest));
        meshes
    }

    fn mesh(triangles: &[ArbitraryTriangle]) -> TriangleMesh {
        let positions = triangles
            .iter()
            .flat_map(|triangle| triangle.vertices.iter().map(ArbitraryPoint::point))
            .collect();
        let indices = (0..triangles.len() as u32)
            .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
            .collect();
        TriangleMesh::new(positions, indices)
    }

    fn fuzz(self) {
        let meshes = self.meshes();
        let ray = self.ray.ray();

        let mut bvh = Bvh::new();
        for mesh in &meshes {
            bvh.add_mesh(mesh).unwrap();
        }
        bvh.build().unwrap();
        assert_eq!(bvh.triangle_count() as usize, self.triangles.len());

        let nearest = bvh.ray_intersect(&ray);
        let occluded = bvh.ray_occluded(&ray);
        assert_eq!(nearest.is_some(), occluded);

        if let Some(its) = nearest {
            // The reported triangle really is hit at the reported distance.
            let mut adapted = ray;
            adapted.adapt_epsilon();
            let hit = its
                .mesh
                .ray_intersect(its.triangle_index, &adapted)
                .expect("reported triangle is not hit");
            assert_relative_eq!(hit.t, its.t);
            assert!(std::ptr::eq(its.mesh, &meshes[its.mesh_index]));

            // Nothing closer was skipped, up to rounding in the box tests.
            adapted.max_t = its.t;
            for mesh in &meshes {
                for triangle in 0..mesh.triangle_count() {
                    if let Some(closer) = mesh.ray_intersect(triangle, &adapted) {
                        assert_relative_eq!(closer.t, its.t, max_relative = 1e-3);
                    }
                }
            }
        }
    }
}
