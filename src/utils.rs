//! Utilities module.

/// Runs two closures, potentially in parallel, and returns both results.
///
/// With the `rayon` feature this is [`rayon::join`]: `b` may be stolen by another worker
/// while the calling thread runs `a`. Without it both run on the calling thread, `a`
/// first.
#[inline]
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "rayon")]
    {
        rayon::join(a, b)
    }

    #[cfg(not(feature = "rayon"))]
    {
        (a(), b())
    }
}

/// Maps every chunk of `items` with `map` and folds the results with `reduce`, starting
/// from `identity()`. Chunks are processed in parallel with the `rayon` feature.
///
/// `reduce` has to be associative and `identity()` its neutral element, since the
/// grouping of the reduction depends on the scheduling.
pub fn map_reduce_chunks<T, R, I, M, F>(
    items: &[T],
    chunk_size: usize,
    identity: I,
    map: M,
    reduce: F,
) -> R
where
    T: Sync,
    R: Send,
    I: Fn() -> R + Sync + Send,
    M: Fn(&[T]) -> R + Sync + Send,
    F: Fn(R, R) -> R + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        items
            .par_chunks(chunk_size)
            .map(map)
            .reduce(identity, reduce)
    }

    #[cfg(not(feature = "rayon"))]
    {
        items
            .chunks(chunk_size)
            .map(map)
            .fold(identity(), reduce)
    }
}

/// Calls `f` on every chunk of `items`, in parallel with the `rayon` feature.
pub fn for_each_chunk<T, F>(items: &[T], chunk_size: usize, f: F)
where
    T: Sync,
    F: Fn(&[T]) + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        items.par_chunks(chunk_size).for_each(f);
    }

    #[cfg(not(feature = "rayon"))]
    {
        items.chunks(chunk_size).for_each(f);
    }
}

/// Collects `f(i)` for every `i` in `0..count`, in parallel with the `rayon` feature.
pub fn collect_range<T, F>(count: u32, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(u32) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..count).into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        (0..count).map(f).collect()
    }
}

/// Formats a byte count with a binary unit suffix, e.g. `1.5 MiB`.
pub fn mem_string(bytes: usize) -> String {
    const SUFFIXES: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut suffix = 0;
    while suffix < SUFFIXES.len() - 1 && value > 1024.0 {
        value /= 1024.0;
        suffix += 1;
    }
    if suffix == 0 {
        format!("{} {}", bytes, SUFFIXES[0])
    } else {
        format!("{:.1} {}", value, SUFFIXES[suffix])
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::{collect_range, for_each_chunk, join, map_reduce_chunks, mem_string};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    /// Test if both halves of a `join` run and return their results in order.
    fn test_join_returns_both() {
        let (a, b) = join(|| (0..100).sum::<u32>(), || "right");
        assert_eq!(a, 4950);
        assert_eq!(b, "right");
    }

    #[test]
    /// Test if a chunked reduction sees every element exactly once.
    fn test_map_reduce_chunks_sums() {
        let items: Vec<u64> = (1..=10_000).collect();
        let sum = map_reduce_chunks(&items, 7, || 0u64, |chunk| chunk.iter().sum(), |a, b| a + b);
        assert_eq!(sum, 10_000 * 10_001 / 2);

        let empty: Vec<u64> = Vec::new();
        assert_eq!(map_reduce_chunks(&empty, 7, || 0usize, |c| c.len(), |a, b| a + b), 0);
    }

    #[test]
    /// Test if `for_each_chunk` visits chunks of the requested size.
    fn test_for_each_chunk() {
        let items = vec![0u8; 1001];
        let chunks = AtomicUsize::new(0);
        let total = AtomicUsize::new(0);
        for_each_chunk(&items, 100, |chunk| {
            assert!(chunk.len() <= 100);
            chunks.fetch_add(1, Ordering::Relaxed);
            total.fetch_add(chunk.len(), Ordering::Relaxed);
        });
        assert_eq!(chunks.into_inner(), 11);
        assert_eq!(total.into_inner(), 1001);
    }

    #[test]
    /// Test if `collect_range` keeps the index order.
    fn test_collect_range_in_order() {
        let squares = collect_range(2000, |i| i * i);
        assert_eq!(squares.len(), 2000);
        assert!(squares.iter().enumerate().all(|(i, &s)| s == (i * i) as u32));
        assert!(collect_range(0, |i| i).is_empty());
    }

    #[test]
    fn test_mem_string() {
        assert_eq!(mem_string(0), "0 B");
        assert_eq!(mem_string(1024), "1024 B");
        assert_eq!(mem_string(1536), "1.5 KiB");
        assert_eq!(mem_string(3 * 1024 * 1024), "3.0 MiB");
    }
}
