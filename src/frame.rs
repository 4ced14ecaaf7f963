//! Orthonormal shading frames.

use crate::Vector3;

/// An orthonormal basis `(s, t, n)`. `n` is the surface normal, `s` and `t` span the
/// tangent plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// First tangent.
    pub s: Vector3,

    /// Second tangent.
    pub t: Vector3,

    /// Normal.
    pub n: Vector3,
}

/// Completes the unit vector `a` to an orthonormal basis `(b, c, a)`.
///
/// # Examples
/// ```
/// use mesh_bvh::frame::coordinate_system;
/// use mesh_bvh::Vector3;
///
/// let (b, c) = coordinate_system(&Vector3::z());
/// assert_eq!(b, Vector3::x());
/// assert_eq!(c, Vector3::y());
/// ```
pub fn coordinate_system(a: &Vector3) -> (Vector3, Vector3) {
    let c = if a.x.abs() > a.y.abs() {
        let inv_len = 1.0 / (a.x * a.x + a.z * a.z).sqrt();
        Vector3::new(a.z * inv_len, 0.0, -a.x * inv_len)
    } else {
        let inv_len = 1.0 / (a.y * a.y + a.z * a.z).sqrt();
        Vector3::new(0.0, a.z * inv_len, -a.y * inv_len)
    };
    let b = c.cross(a);
    (b, c)
}

impl Frame {
    /// Creates a [`Frame`] from three orthonormal vectors.
    pub fn new(s: Vector3, t: Vector3, n: Vector3) -> Frame {
        Frame { s, t, n }
    }

    /// Creates a [`Frame`] around the unit normal `n`, picking the tangents with
    /// [`coordinate_system`].
    pub fn from_normal(n: Vector3) -> Frame {
        let (s, t) = coordinate_system(&n);
        Frame { s, t, n }
    }

    /// Converts a world space vector into this frame.
    pub fn to_local(&self, v: &Vector3) -> Vector3 {
        Vector3::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    /// Converts a vector expressed in this frame back to world space.
    pub fn to_world(&self, v: &Vector3) -> Vector3 {
        self.s * v.x + self.t * v.y + self.n * v.z
    }
}

#[cfg(test)]
mod tests {
    use crate::frame::Frame;
    use crate::testbase::{tuple_to_vector, tuplevec_local_strategy};
    use crate::Vector3;
    use float_eq::assert_float_eq;

    use proptest::prelude::*;

    #[test]
    fn test_axis_aligned_frames() {
        let frame = Frame::from_normal(Vector3::x());
        assert_eq!(frame.n, Vector3::x());
        assert_float_eq!(frame.s.dot(&frame.n), 0.0, abs <= 1e-6);
        assert_float_eq!(frame.t.dot(&frame.n), 0.0, abs <= 1e-6);

        let frame = Frame::from_normal(-Vector3::z());
        assert_float_eq!(frame.s.cross(&frame.t).dot(&frame.n), 1.0, abs <= 1e-6);
    }

    proptest! {
        // The basis built around any normal is orthonormal and right handed.
        #[test]
        fn test_frame_is_orthonormal(data in tuplevec_local_strategy()) {
            let v = tuple_to_vector(&data);
            prop_assume!(v.norm() > 1e-2);
            let frame = Frame::from_normal(v.normalize());

            prop_assert!((frame.s.norm() - 1.0).abs() < 1e-4);
            prop_assert!((frame.t.norm() - 1.0).abs() < 1e-4);
            prop_assert!(frame.s.dot(&frame.t).abs() < 1e-4);
            prop_assert!(frame.s.dot(&frame.n).abs() < 1e-4);
            prop_assert!(frame.t.dot(&frame.n).abs() < 1e-4);
            prop_assert!((frame.s.cross(&frame.t) - frame.n).norm() < 1e-3);
        }

        // Converting to local coordinates and back is the identity.
        #[test]
        fn test_local_world_round_trip(n in tuplevec_local_strategy(), v in tuplevec_local_strategy()) {
            let n = tuple_to_vector(&n);
            prop_assume!(n.norm() > 1e-2);
            let frame = Frame::from_normal(n.normalize());
            let v = tuple_to_vector(&v);

            let back = frame.to_world(&frame.to_local(&v));
            prop_assert!((back - v).norm() <= 1e-3 * v.norm().max(1.0));
        }
    }
}
