use crate::aabb::Aabb;
use crate::Real;

/// Number of equal-width bins the split axis is divided into.
pub const BIN_COUNT: usize = 16;

/// Per-bin triangle counts and bounds, accumulated while looking for a split plane.
///
/// Several [`Bins`] filled from disjoint parts of the index array combine with
/// [`Bins::merge`]; the result does not depend on how the parts were grouped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bins {
    /// The number of triangles whose centroid fell into each bin.
    pub counts: [u32; BIN_COUNT],

    /// The joint [`Aabb`] of the triangles in each bin.
    pub aabbs: [Aabb; BIN_COUNT],
}

impl Bins {
    /// Returns bins holding no triangles.
    pub fn empty() -> Bins {
        Bins {
            counts: [0; BIN_COUNT],
            aabbs: [Aabb::empty(); BIN_COUNT],
        }
    }

    /// Adds a triangle with the given bounds to bin `index`.
    #[inline]
    pub fn add(&mut self, index: usize, aabb: &Aabb) {
        self.counts[index] += 1;
        self.aabbs[index].join_mut(aabb);
    }

    /// Join the contents of two [`Bins`].
    pub fn merge(mut self, other: Bins) -> Bins {
        for i in 0..BIN_COUNT {
            self.counts[i] += other.counts[i];
            self.aabbs[i].join_mut(&other.aabbs[i]);
        }
        self
    }

    /// Total number of triangles in all bins.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Maps a centroid coordinate along the split axis to its bin. Values outside the
/// binned range end up in the first or last bin.
#[inline]
pub fn bin_index(value: Real, min: Real, inv_bin_size: Real) -> usize {
    let index = ((value - min) * inv_bin_size) as i64;
    index.clamp(0, BIN_COUNT as i64 - 1) as usize
}
