//! Slab tests between a [`Ray`] and an [`Aabb`].

use super::Aabb;
use crate::ray::Ray;
use crate::Real;

impl Aabb {
    /// Returns the parametric interval `(near_t, far_t)` in which the unbounded line
    /// through `ray` overlaps this [`Aabb`], or `None` if it misses.
    ///
    /// The ray segment `[min_t, max_t]` is ignored. A direction component of zero only
    /// passes if the origin lies within the slab of that axis. Inverted boxes, such as
    /// [`Aabb::empty`], are never hit.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::ray::Ray;
    /// use mesh_bvh::{Point3, Vector3};
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(1.0, -1.0, -1.0), Point3::new(3.0, 1.0, 1.0));
    /// let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    ///
    /// assert_eq!(aabb.ray_intersect_range(&ray), Some((1.0, 3.0)));
    /// ```
    pub fn ray_intersect_range(&self, ray: &Ray) -> Option<(Real, Real)> {
        let mut near_t = Real::NEG_INFINITY;
        let mut far_t = Real::INFINITY;

        for i in 0..3 {
            let origin = ray.origin[i];
            let min_val = self.min[i];
            let max_val = self.max[i];

            // The swap below would turn an inverted slab into an unbounded one.
            if !(min_val <= max_val) {
                return None;
            }

            if ray.direction[i] == 0.0 {
                if origin < min_val || origin > max_val {
                    return None;
                }
            } else {
                let mut t1 = (min_val - origin) * ray.inv_direction[i];
                let mut t2 = (max_val - origin) * ray.inv_direction[i];

                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                near_t = near_t.max(t1);
                far_t = far_t.min(t2);

                // Written negated so that a NaN interval is rejected as well.
                if !(near_t <= far_t) {
                    return None;
                }
            }
        }

        Some((near_t, far_t))
    }

    /// Tests whether the segment `[min_t, max_t]` of `ray` overlaps this [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::ray::Ray;
    /// use mesh_bvh::{Point3, Vector3};
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(99.9, -1.0, -1.0), Point3::new(100.1, 1.0, 1.0));
    /// let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    ///
    /// assert!(aabb.ray_intersect(&ray));
    /// assert!(!aabb.ray_intersect(&ray.segment(0.0, 50.0)));
    /// ```
    pub fn ray_intersect(&self, ray: &Ray) -> bool {
        match self.ray_intersect_range(ray) {
            Some((near_t, far_t)) => ray.min_t <= far_t && near_t <= ray.max_t,
            None => false,
        }
    }
}
