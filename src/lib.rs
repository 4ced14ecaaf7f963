//! A crate which builds a bounding volume hierarchy over triangle meshes and answers
//! "does this ray hit anything, and what" queries against it.
//!
//! ## About
//!
//! Scenes in an offline renderer easily reach millions of triangles. Testing every ray
//! against every triangle is hopeless, so the meshes are registered with a [`Bvh`] which
//! sorts them into a binary tree of axis aligned bounding boxes. The tree is built once,
//! in parallel, using the Surface Area Heuristic (SAH) to decide where to split, and is
//! then queried by any number of threads with an allocation-free stack based traversal.
//!
//! ## Example
//!
//! ```
//! use mesh_bvh::bvh::Bvh;
//! use mesh_bvh::mesh::TriangleMesh;
//! use mesh_bvh::ray::Ray;
//! use mesh_bvh::{Point3, Vector3};
//!
//! let mesh = TriangleMesh::new(
//!     vec![
//!         Point3::new(-1.0, -1.0, 0.0),
//!         Point3::new(1.0, -1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! );
//!
//! let mut bvh = Bvh::new();
//! bvh.add_mesh(&mesh).unwrap();
//! bvh.build().unwrap();
//!
//! let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
//! let its = bvh.ray_intersect(&ray).unwrap();
//! assert!((its.t - 5.0).abs() < 1e-4);
//! assert!(bvh.ray_occluded(&ray));
//! ```
//!
//! ## Features
//!
//! - `rayon` (default **enabled**) - builds the hierarchy on the rayon thread pool
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for some types
//!
//! [`Bvh`]: bvh::Bvh

#![cfg_attr(all(feature = "bench", test), feature(test))]

#[cfg(all(feature = "bench", test))]
extern crate test;

/// Float type used by this crate.
pub type Real = f32;

/// Point math type used by this crate. Type alias for [`nalgebra::Point3`].
pub type Point3 = nalgebra::Point3<Real>;

/// Vector math type used by this crate. Type alias for [`nalgebra::Vector3`].
pub type Vector3 = nalgebra::Vector3<Real>;

/// Texture coordinate type used by this crate. Type alias for [`nalgebra::Point2`].
pub type Point2 = nalgebra::Point2<Real>;

/// Default lower bound of a ray segment. Also used as the smallest extent along which
/// the builder still attempts to split a node.
pub const EPSILON: Real = 1e-4;

pub mod aabb;
pub mod axis;
pub mod bvh;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod ray;
mod utils;

#[cfg(test)]
mod testbase;
