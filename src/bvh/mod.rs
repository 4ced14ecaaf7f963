//! This module defines a [`Bvh`] over triangle meshes, its packed [`BvhNode`]s and the
//! [`Intersection`] records its queries return.
//!
//! [`Bvh`]: struct.Bvh.html
//! [`BvhNode`]: struct.BvhNode.html
//! [`Intersection`]: struct.Intersection.html
//!

pub mod bucket;
pub mod build;
mod bvh_impl;
mod bvh_node;
mod compact;
mod registry;
mod traverse;

pub use self::bvh_impl::*;
pub use self::bvh_node::*;
pub use self::traverse::{Intersection, STACK_SIZE};
