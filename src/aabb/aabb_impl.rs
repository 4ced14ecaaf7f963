//! Axis Aligned Bounding Boxes.

use std::fmt;

use crate::axis::Axis;
use crate::{Point3, Real, Vector3};

/// [`Aabb`] struct.
///
/// A box is *valid* iff `min[d] <= max[d]` along every axis. The [`empty`] box has its
/// minimum at `+inf` and its maximum at `-inf`, which makes it the identity of [`join`].
///
/// [`empty`]: Aabb::empty
/// [`join`]: Aabb::join
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum coordinates
    pub min: Point3,

    /// Maximum coordinates
    pub max: Point3,
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
pub trait Bounded {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::{Aabb, Bounded};
    /// use mesh_bvh::Point3;
    ///
    /// struct Something;
    ///
    /// impl Bounded for Something {
    ///     fn aabb(&self) -> Aabb {
    ///         let point1 = Point3::new(0.0, 0.0, 0.0);
    ///         let point2 = Point3::new(1.0, 1.0, 1.0);
    ///         Aabb::with_bounds(point1, point2)
    ///     }
    /// }
    ///
    /// let something = Something;
    /// let aabb = something.aabb();
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
    /// ```
    fn aabb(&self) -> Aabb;
}

impl Aabb {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.min.x, -1.0);
    /// assert_eq!(aabb.max.z, 1.0);
    /// ```
    pub fn with_bounds(min: Point3, max: Point3) -> Aabb {
        Aabb { min, max }
    }

    /// Creates a collapsed [`Aabb`] containing exactly one point.
    pub fn from_point(p: Point3) -> Aabb {
        Aabb { min: p, max: p }
    }

    /// Creates a new empty [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    ///
    /// let aabb = Aabb::empty();
    /// assert!(!aabb.is_valid());
    /// assert!(aabb.min.x > aabb.max.x);
    /// ```
    pub fn empty() -> Aabb {
        Aabb {
            min: Point3::new(Real::INFINITY, Real::INFINITY, Real::INFINITY),
            max: Point3::new(Real::NEG_INFINITY, Real::NEG_INFINITY, Real::NEG_INFINITY),
        }
    }

    /// Resets this [`Aabb`] to the empty box.
    pub fn reset(&mut self) {
        *self = Aabb::empty();
    }

    /// Returns true if the [`Point3`] is inside the [`Aabb`], boundary included.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
    /// assert!(!aabb.contains(&Point3::new(2.0, 0.0, 0.0)));
    /// ```
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if `other` lies on or within this [`Aabb`].
    /// An empty `other` covers no space and is therefore always contained.
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] && other.max[i] <= self.max[i])
    }

    /// Returns true if the two boxes overlap, touching boundaries included.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|i| other.min[i] <= self.max[i] && other.max[i] >= self.min[i])
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    /// The result is also called the joint [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0, 0.0, 0.0), Point3::new(-100.0, 1.0, 1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert_eq!(joint.min, Point3::new(-101.0, 0.0, 0.0));
    /// assert_eq!(joint.max, Point3::new(101.0, 1.0, 1.0));
    /// ```
    pub fn join(&self, other: &Aabb) -> Aabb {
        Aabb::with_bounds(
            Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Mutable version of [`Aabb::join`].
    pub fn join_mut(&mut self, other: &Aabb) {
        *self = self.join(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point3`] `other`.
    pub fn grow(&self, other: &Point3) -> Aabb {
        Aabb::with_bounds(
            Point3::new(
                self.min.x.min(other.x),
                self.min.y.min(other.y),
                self.min.z.min(other.z),
            ),
            Point3::new(
                self.max.x.max(other.x),
                self.max.y.max(other.y),
                self.max.z.max(other.z),
            ),
        )
    }

    /// Mutable version of [`Aabb::grow`].
    pub fn grow_mut(&mut self, other: &Point3) {
        *self = self.grow(other);
    }

    /// Shrinks this [`Aabb`] to its intersection with `other`.
    pub fn clip(&mut self, other: &Aabb) {
        self.min = Point3::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        self.max = Point3::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );
    }

    /// Returns the size of this [`Aabb`] in all three dimensions.
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Alias of [`Aabb::size`].
    pub fn extents(&self) -> Vector3 {
        self.size()
    }

    /// Returns the center [`Point3`] of the [`Aabb`].
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns true if `min <= max` along every axis.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.max[i] >= self.min[i])
    }

    /// Returns true if the [`Aabb`] has collapsed to a single point.
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    /// Returns true if the [`Aabb`] has a positive extent along every axis.
    pub fn has_volume(&self) -> bool {
        (0..3).all(|i| self.max[i] > self.min[i])
    }

    /// Returns the volume of this [`Aabb`].
    pub fn volume(&self) -> Real {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Returns the total surface area of this [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(aabb.surface_area(), 22.0);
    /// ```
    pub fn surface_area(&self) -> Real {
        let size = self.size();
        2.0 * (size.x * size.y + size.x * size.z + size.y * size.z)
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    /// Ties are resolved in favour of the lower axis.
    ///
    /// # Examples
    /// ```
    /// use mesh_bvh::aabb::Aabb;
    /// use mesh_bvh::axis::Axis;
    /// use mesh_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 5.0, 5.0));
    /// assert_eq!(aabb.largest_axis(), Axis::Y);
    /// ```
    pub fn largest_axis(&self) -> Axis {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            Axis::X
        } else if size.y >= size.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns the axis along which the [`Aabb`] is the thinnest.
    pub fn smallest_axis(&self) -> Axis {
        let size = self.size();
        if size.x <= size.y && size.x <= size.z {
            Axis::X
        } else if size.y <= size.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns one of the eight corners. Bit `i` of `index` selects `max` along axis `i`.
    pub fn corner(&self, index: usize) -> Point3 {
        let mut result = self.min;
        for i in 0..3 {
            if index & (1 << i) != 0 {
                result[i] = self.max[i];
            }
        }
        result
    }

    /// Squared distance between the closest point of the [`Aabb`] and `p`.
    pub fn squared_distance_to(&self, p: &Point3) -> Real {
        let mut result = 0.0;
        for i in 0..3 {
            let value = if p[i] < self.min[i] {
                self.min[i] - p[i]
            } else if p[i] > self.max[i] {
                p[i] - self.max[i]
            } else {
                0.0
            };
            result += value * value;
        }
        result
    }

    /// Distance between the closest point of the [`Aabb`] and `p`.
    pub fn distance_to(&self, p: &Point3) -> Real {
        self.squared_distance_to(p).sqrt()
    }
}

impl Default for Aabb {
    fn default() -> Aabb {
        Aabb::empty()
    }
}

impl fmt::Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "Aabb[invalid]")
        } else {
            write!(
                f,
                "Aabb[min=[{}, {}, {}], max=[{}, {}, {}]]",
                self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
            )
        }
    }
}

/// Implementation of [`Bounded`] for [`Aabb`].
impl Bounded for Aabb {
    fn aabb(&self) -> Aabb {
        *self
    }
}
