//! Errors reported while registering meshes and building a [`Bvh`].
//!
//! [`Bvh`]: crate::bvh::Bvh

use thiserror::Error;

/// Everything that can go wrong before a [`Bvh`] is ready for queries.
///
/// [`Bvh`]: crate::bvh::Bvh
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// Meshes can only be registered before [`Bvh::build`] (or after [`Bvh::clear`]).
    ///
    /// [`Bvh::build`]: crate::bvh::Bvh::build
    /// [`Bvh::clear`]: crate::bvh::Bvh::clear
    #[error("cannot register a mesh with a BVH that has already been built")]
    MeshAfterBuild,

    /// The scene holds more triangles than the node arena can address.
    #[error("scene has {count} triangles, at most {max} are supported")]
    TooManyTriangles { count: u64, max: u64 },

    /// The packed node record does not have the size the arena layout was designed for.
    #[error("BVH node is not packed: expected {expected} bytes, found {actual}")]
    NodeLayout { expected: usize, actual: usize },
}
