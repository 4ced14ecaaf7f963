//! This module holds the [`Ray`] definition and the ray/triangle intersection test.
mod ray_impl;

pub use self::ray_impl::*;
