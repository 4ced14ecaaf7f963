use std::{hint::black_box, time::Instant};

use clap::Parser;
use mesh_bvh::{bvh::Bvh, mesh::Mesh, mesh::TriangleMesh, ray::Ray};
use nalgebra::{Point3, Vector3};
use rand::{rng, Rng};

/// Prints the median speedup of building a `Bvh` and tracing rays through it over
/// testing every ray against every triangle.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(long)]
    rays: usize,
    #[arg(long)]
    triangles: usize,
    #[arg(long)]
    samples: usize,
    /// Only ask whether something is hit instead of searching the nearest hit.
    #[arg(long)]
    shadow: bool,
}

fn random_vector(rng: &mut impl Rng, extent: f32) -> Vector3<f32> {
    Vector3::new(
        rng.random_range(-extent..=extent),
        rng.random_range(-extent..=extent),
        rng.random_range(-extent..=extent),
    )
}

fn random_soup(rng: &mut impl Rng, count: usize) -> TriangleMesh {
    let mut positions = Vec::with_capacity(3 * count);
    let mut indices = Vec::with_capacity(count);
    for i in 0..count as u32 {
        let center = Point3::origin() + random_vector(rng, 1000.0);
        for _ in 0..3 {
            positions.push(center + random_vector(rng, 1.0));
        }
        indices.push([3 * i, 3 * i + 1, 3 * i + 2]);
    }
    TriangleMesh::new(positions, indices)
}

fn brute_force(mesh: &TriangleMesh, ray: &Ray, shadow: bool) -> bool {
    let mut ray = *ray;
    ray.adapt_epsilon();
    let mut found = false;
    for triangle in 0..mesh.triangle_count() {
        if let Some(hit) = mesh.ray_intersect(triangle, &ray) {
            found = true;
            if shadow {
                break;
            }
            ray.max_t = hit.t;
        }
    }
    found
}

fn main() {
    let cli = Cli::parse();
    let mut rng = rng();

    let mut samples = Vec::new();
    let mut rays = Vec::new();

    for i in 0..cli.samples {
        rays.clear();
        for _ in 0..cli.rays {
            rays.push(Ray::new(
                Point3::origin() + random_vector(&mut rng, 1.0),
                random_vector(&mut rng, 1.0),
            ));
        }
        let mesh = random_soup(&mut rng, cli.triangles);

        let mut brute_force_duration = f64::NAN;
        let mut bvh_duration = f64::NAN;

        let mut measure_brute_force = |mesh: &TriangleMesh| {
            let start_brute_force = Instant::now();
            for ray in &rays {
                black_box(brute_force(black_box(mesh), black_box(ray), cli.shadow));
            }
            brute_force_duration = start_brute_force.elapsed().as_secs_f64();
        };

        let mut measure_bvh = |mesh: &TriangleMesh| {
            let start_bvh = Instant::now();
            let mut bvh = Bvh::new();
            if let Err(err) = bvh.add_mesh(black_box(mesh)).and_then(|_| bvh.build()) {
                eprintln!("failed to build the BVH: {err}");
                std::process::exit(1);
            }
            for ray in &rays {
                if cli.shadow {
                    black_box(bvh.ray_occluded(black_box(ray)));
                } else {
                    black_box(bvh.ray_intersect(black_box(ray)).map(|its| its.t));
                }
            }
            bvh_duration = start_bvh.elapsed().as_secs_f64();
        };

        // Flip order to minimize bias due to caching.
        if i % 2 == 0 {
            measure_bvh(&mesh);
            measure_brute_force(&mesh);
        } else {
            measure_brute_force(&mesh);
            measure_bvh(&mesh);
        }

        samples.push(brute_force_duration / bvh_duration);
    }

    if samples.is_empty() {
        return;
    }
    samples.sort_by(f64::total_cmp);

    // Median.
    println!("{}", samples[samples.len() / 2]);
}
