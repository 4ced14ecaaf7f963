//! This module defines a Ray structure and the intersection algorithm
//! for triangles. The slab test against [`Aabb`]s lives next to the [`Aabb`].
//!
//! [`Aabb`]: crate::aabb::Aabb

use crate::{Point3, Real, Vector3, EPSILON};

/// A ray segment `origin + t * direction` for `t` in `[min_t, max_t]`, together with
/// the componentwise reciprocals of its direction.
///
/// The reciprocals are cached for the slab test. Call [`Ray::update`] after changing
/// `direction` by hand.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The ray origin.
    pub origin: Point3,

    /// The ray direction. Not normalized; `t` is measured in multiples of it.
    pub direction: Vector3,

    /// Inverse (1/x) ray direction. Cached for use in [`Aabb`] intersections.
    ///
    /// [`Aabb`]: crate::aabb::Aabb
    pub inv_direction: Vector3,

    /// Minimum position on the ray segment.
    pub min_t: Real,

    /// Maximum position on the ray segment.
    pub max_t: Real,
}

/// A struct which is returned by [`Ray::intersects_triangle()`] on a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray, in multiples of its direction.
    pub t: Real,

    /// U coordinate of the intersection (weight of the second vertex).
    pub u: Real,

    /// V coordinate of the intersection (weight of the third vertex).
    pub v: Real,
}

impl Ray {
    /// Creates a new [`Ray`] from an `origin` and a `direction`, covering the segment
    /// `[EPSILON, +inf]`.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::ray::Ray;
    /// use mesh_bvh::{Point3, Vector3, EPSILON};
    ///
    /// let origin = Point3::new(0.0, 0.0, 0.0);
    /// let direction = Vector3::new(2.0, 0.0, 0.0);
    /// let ray = Ray::new(origin, direction);
    ///
    /// assert_eq!(ray.origin, origin);
    /// assert_eq!(ray.direction, direction);
    /// assert_eq!(ray.min_t, EPSILON);
    /// assert_eq!(ray.inv_direction.x, 0.5);
    /// ```
    pub fn new(origin: Point3, direction: Vector3) -> Ray {
        Ray::with_segment(origin, direction, EPSILON, Real::INFINITY)
    }

    /// Creates a new [`Ray`] covering the segment `[min_t, max_t]`.
    pub fn with_segment(origin: Point3, direction: Vector3, min_t: Real, max_t: Real) -> Ray {
        Ray {
            origin,
            direction,
            inv_direction: direction.map(|x| 1.0 / x),
            min_t,
            max_t,
        }
    }

    /// Returns a copy of this ray covering a different segment.
    pub fn segment(&self, min_t: Real, max_t: Real) -> Ray {
        Ray {
            min_t,
            max_t,
            ..*self
        }
    }

    /// Recomputes the cached reciprocal direction after `direction` was modified.
    pub fn update(&mut self) {
        self.inv_direction = self.direction.map(|x| 1.0 / x);
    }

    /// Scales a `min_t` of exactly [`EPSILON`] by the largest absolute coordinate of the
    /// origin, so that rays leaving a surface far from the world origin do not hit it
    /// again. Any other `min_t` is left alone.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::ray::Ray;
    /// use mesh_bvh::{Point3, Vector3, EPSILON};
    ///
    /// let mut ray = Ray::new(Point3::new(10.0, -200.0, 3.0), Vector3::new(1.0, 0.0, 0.0));
    /// ray.adapt_epsilon();
    /// assert_eq!(ray.min_t, EPSILON * 200.0);
    /// ```
    pub fn adapt_epsilon(&mut self) {
        if self.min_t == EPSILON {
            self.min_t = self.min_t.max(self.min_t * self.origin.coords.amax());
        }
    }

    /// Returns the position of a point along the ray.
    pub fn at(&self, t: Real) -> Point3 {
        self.origin + self.direction * t
    }

    /// Returns a ray that points into the opposite direction.
    pub fn reverse(&self) -> Ray {
        Ray {
            direction: -self.direction,
            inv_direction: -self.inv_direction,
            ..*self
        }
    }

    /// Implementation of the
    /// [Möller-Trumbore triangle/ray intersection algorithm](https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm).
    ///
    /// Both faces are hit. Returns the distance and the `u`/`v` coordinates of the hit
    /// if it lies within `[min_t, max_t]`, otherwise `None`.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::ray::Ray;
    /// use mesh_bvh::{Point3, Vector3};
    ///
    /// let a = Point3::new(0.0, 0.0, 0.0);
    /// let b = Point3::new(1.0, 0.0, 0.0);
    /// let c = Point3::new(0.0, 1.0, 0.0);
    /// let ray = Ray::new(Point3::new(0.25, 0.25, 2.0), Vector3::new(0.0, 0.0, -1.0));
    ///
    /// let hit = ray.intersects_triangle(&a, &b, &c).unwrap();
    /// assert!((hit.t - 2.0).abs() < 1e-5);
    /// assert!((hit.u - 0.25).abs() < 1e-5);
    /// assert!((hit.v - 0.25).abs() < 1e-5);
    /// ```
    #[allow(clippy::many_single_char_names)]
    pub fn intersects_triangle(&self, a: &Point3, b: &Point3, c: &Point3) -> Option<TriangleHit> {
        let a_to_b = *b - *a;
        let a_to_c = *c - *a;

        // Begin calculating determinant - also used to calculate u parameter
        // u_vec lies in view plane
        // length of a_to_c in view_plane = |u_vec| = |a_to_c|*sin(a_to_c, dir)
        let u_vec = self.direction.cross(&a_to_c);

        // If determinant is near zero, ray lies in plane of triangle
        // The determinant corresponds to the parallelepiped volume:
        // det = 0 => [dir, a_to_b, a_to_c] not linearly independant
        let det = a_to_b.dot(&u_vec);
        if det > -1e-8 && det < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;

        // Vector from point a to ray origin
        let a_to_origin = self.origin - *a;

        // Calculate u parameter
        let u = a_to_origin.dot(&u_vec) * inv_det;

        // Test bounds: u < 0 || u > 1 => outside of triangle
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        // Prepare to test v parameter
        let v_vec = a_to_origin.cross(&a_to_b);

        // Calculate v parameter and test bound
        let v = self.direction.dot(&v_vec) * inv_det;
        // The intersection lies outside of the triangle
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = a_to_c.dot(&v_vec) * inv_det;
        if t >= self.min_t && t <= self.max_t {
            Some(TriangleHit { t, u, v })
        } else {
            None
        }
    }
}
