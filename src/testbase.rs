//! Common utilities shared by unit tests.
#![cfg(test)]

use crate::aabb::Aabb;
use crate::mesh::{Mesh, TriangleMesh};
use crate::ray::Ray;
use crate::{Point3, Real, Vector3};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A vector represented as a tuple
pub type TupleVec = (f32, f32, f32);

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e10 to 10e10
/// A small enough range to prevent most fp32 errors from breaking certain tests
/// Tests which rely on this strategy should probably be rewritten
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (
        -10e10_f32..10e10_f32,
        -10e10_f32..10e10_f32,
        -10e10_f32..10e10_f32,
    )
}

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -100 to 100.
/// Used where products of coordinates have to stay well inside the fp32 range.
pub fn tuplevec_local_strategy() -> impl Strategy<Value = TupleVec> {
    (-100_f32..100_f32, -100_f32..100_f32, -100_f32..100_f32)
}

/// Convert a `TupleVec` to a [`Point3`].
pub fn tuple_to_point(tpl: &TupleVec) -> Point3 {
    Point3::new(tpl.0, tpl.1, tpl.2)
}

/// Convert a `TupleVec` to a [`Vector3`].
pub fn tuple_to_vector(tpl: &TupleVec) -> Vector3 {
    Vector3::new(tpl.0, tpl.1, tpl.2)
}

/// Appends the twelve triangles of a unit size cube centered at `pos`.
fn push_cube(pos: Point3, positions: &mut Vec<Point3>, indices: &mut Vec<[u32; 3]>) {
    let base = positions.len() as u32;
    for &(x, y, z) in &[
        (0.5, 0.5, -0.5),
        (0.5, 0.5, 0.5),
        (-0.5, 0.5, 0.5),
        (-0.5, 0.5, -0.5),
        (0.5, -0.5, -0.5),
        (0.5, -0.5, 0.5),
        (-0.5, -0.5, 0.5),
        (-0.5, -0.5, -0.5),
    ] {
        positions.push(pos + Vector3::new(x, y, z));
    }

    // top_front_right, top_back_right, top_back_left, top_front_left,
    // bottom_front_right, bottom_back_right, bottom_back_left, bottom_front_left
    for &[a, b, c] in &[
        [1, 0, 3],
        [3, 2, 1],
        [7, 4, 5],
        [5, 6, 7],
        [2, 3, 7],
        [7, 6, 2],
        [4, 0, 1],
        [1, 5, 4],
        [3, 0, 4],
        [4, 7, 3],
        [5, 1, 2],
        [2, 6, 5],
    ] {
        indices.push([base + a, base + b, base + c]);
    }
}

/// Implementation of splitmix64.
/// For reference see: http://xoroshiro.di.unimi.it/splitmix64.c
fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E3779B97F4A7C15u64);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EBu64);
    z ^ (z >> 31)
}

/// Generates a new `i32` triple. Mutates the seed.
pub fn next_point3_raw(seed: &mut u64) -> (i32, i32, i32) {
    let u = splitmix64(seed);
    let a = ((u >> 32) & 0xFFFFFFFF) as i64 - 0x80000000;
    let b = (u & 0xFFFFFFFF) as i64 - 0x80000000;
    let c = a ^ b.rotate_left(6);
    (a as i32, b as i32, c as i32)
}

/// Generates a new `Point3`, which will lie inside the given `aabb`. Mutates the seed.
pub fn next_point3(seed: &mut u64, aabb: &Aabb) -> Point3 {
    let (a, b, c) = next_point3_raw(seed);
    let float_vector = Vector3::new(
        (a as f32 / i32::MAX as f32) + 1.0,
        (b as f32 / i32::MAX as f32) + 1.0,
        (c as f32 / i32::MAX as f32) + 1.0,
    ) * 0.5;

    assert!(float_vector.x >= 0.0 && float_vector.x <= 1.0);
    assert!(float_vector.y >= 0.0 && float_vector.y <= 1.0);
    assert!(float_vector.z >= 0.0 && float_vector.z <= 1.0);

    let size = aabb.size();
    aabb.min + size.component_mul(&float_vector)
}

/// Returns an `Aabb` which defines the default testing space bounds.
pub fn default_bounds() -> Aabb {
    Aabb::with_bounds(
        Point3::new(-100.0, -100.0, -100.0),
        Point3::new(100.0, 100.0, 100.0),
    )
}

/// Creates a mesh of `n` deterministic random unit cubes inside `bounds`.
pub fn create_n_cubes(n: usize, bounds: &Aabb) -> TriangleMesh {
    create_n_cubes_seeded(n, bounds, 0)
}

/// Like [`create_n_cubes`], with an explicit seed for the cube positions.
pub fn create_n_cubes_seeded(n: usize, bounds: &Aabb, mut seed: u64) -> TriangleMesh {
    let mut positions = Vec::with_capacity(8 * n);
    let mut indices = Vec::with_capacity(12 * n);
    for _ in 0..n {
        push_cube(next_point3(&mut seed, bounds), &mut positions, &mut indices);
    }
    TriangleMesh::new(positions, indices)
}

/// Creates a mesh of `n` random, mostly small triangles inside `bounds`.
pub fn create_triangle_soup(n: usize, bounds: &Aabb, rng: &mut StdRng) -> TriangleMesh {
    let size = bounds.size();
    let mut positions = Vec::with_capacity(3 * n);
    let mut indices = Vec::with_capacity(n);
    for i in 0..n as u32 {
        let anchor = bounds.min
            + size.component_mul(&Vector3::new(
                rng.random::<Real>(),
                rng.random::<Real>(),
                rng.random::<Real>(),
            ));
        positions.push(anchor);
        for _ in 0..2 {
            let offset = Vector3::new(
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
            );
            positions.push(anchor + offset);
        }
        indices.push([3 * i, 3 * i + 1, 3 * i + 2]);
    }
    TriangleMesh::new(positions, indices)
}

/// Creates a `Ray` from `rng` whose origin lies inside `bounds` and which points at some
/// other point inside `bounds`. The direction is normalized.
pub fn create_random_ray(rng: &mut StdRng, bounds: &Aabb) -> Ray {
    let mut seed = rng.random::<u64>();
    let origin = next_point3(&mut seed, bounds);
    let mut target = next_point3(&mut seed, bounds);
    while target == origin {
        target = next_point3(&mut seed, bounds);
    }
    Ray::new(origin, (target - origin).normalize())
}

/// A seeded `StdRng` so that failing scenes can be reproduced.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Nearest hit found by testing every triangle of every mesh, with the same epsilon
/// handling as the `Bvh`. Returns `(mesh_index, triangle_index, t)`.
pub fn brute_force_nearest<M: Mesh + ?Sized>(
    meshes: &[&M],
    ray: &Ray,
) -> Option<(usize, u32, Real)> {
    let mut ray = *ray;
    ray.adapt_epsilon();
    let mut nearest = None;
    for (mesh_index, mesh) in meshes.iter().enumerate() {
        for triangle in 0..mesh.triangle_count() {
            if let Some(hit) = mesh.ray_intersect(triangle, &ray) {
                ray.max_t = hit.t;
                nearest = Some((mesh_index, triangle, hit.t));
            }
        }
    }
    nearest
}

/// Whether any triangle of any mesh intersects `ray`.
pub fn brute_force_occluded<M: Mesh + ?Sized>(meshes: &[&M], ray: &Ray) -> bool {
    let mut ray = *ray;
    ray.adapt_epsilon();
    meshes.iter().any(|mesh| {
        (0..mesh.triangle_count()).any(|triangle| mesh.ray_intersect(triangle, &ray).is_some())
    })
}

/// Benchmark intersecting every triangle of `mesh` without acceleration structures.
#[cfg(feature = "bench")]
pub fn intersect_list(mesh: &TriangleMesh, bounds: &Aabb, b: &mut ::test::Bencher) {
    let mut rng = seeded_rng(0);
    b.iter(|| {
        let ray = create_random_ray(&mut rng, bounds);
        brute_force_nearest(&[mesh], &ray)
    });
}

#[cfg(feature = "bench")]
#[bench]
/// Benchmark intersecting 120,000 triangles directly.
fn bench_intersect_120k_triangles_list(b: &mut ::test::Bencher) {
    let bounds = default_bounds();
    let mesh = create_n_cubes(10_000, &bounds);
    intersect_list(&mesh, &bounds, b);
}

#[cfg(test)]
mod tests {
    use crate::mesh::Mesh;
    use crate::ray::Ray;
    use crate::testbase::{
        brute_force_nearest, brute_force_occluded, create_n_cubes, default_bounds, next_point3,
    };
    use crate::{Point3, Vector3};

    #[test]
    fn test_next_point3_stays_inside_bounds() {
        let bounds = default_bounds();
        let mut seed = 42;
        for _ in 0..1000 {
            assert!(bounds.contains(&next_point3(&mut seed, &bounds)));
        }
    }

    #[test]
    fn test_cube_mesh_layout() {
        let mesh = create_n_cubes(3, &default_bounds());
        assert_eq!(mesh.triangle_count(), 36);
        assert_eq!(mesh.positions().len(), 24);
        for i in 0..mesh.triangle_count() {
            let size = mesh.triangle_bounding_box(i).size();
            // Every face triangle spans exactly two axes of a unit cube.
            let spanned = (0..3).filter(|&axis| size[axis] > 0.5).count();
            assert_eq!(spanned, 2);
        }
    }

    #[test]
    fn test_brute_force_hits_single_cube_front_face() {
        let mesh = create_n_cubes(1, &default_bounds());
        let center = mesh.bounding_box().center();
        let ray = Ray::new(center + Vector3::new(0.1, 0.2, -10.0), Vector3::z());

        let (mesh_index, _, t) = brute_force_nearest(&[&mesh], &ray).unwrap();
        assert_eq!(mesh_index, 0);
        assert!((t - 9.5).abs() < 1e-3);
        assert!(brute_force_occluded(&[&mesh], &ray));

        let miss = Ray::new(Point3::new(1000.0, 1000.0, 1000.0), Vector3::x());
        assert!(brute_force_nearest(&[&mesh], &miss).is_none());
        assert!(!brute_force_occluded(&[&mesh], &miss));
    }
}
