//! Euclidean distance and centroid helpers.

use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load(chunk: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    lanes.copy_from_slice(chunk);
    f32x8::new(lanes)
}

/// Squared Euclidean distance between two equally sized vectors.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let tail_a = chunks_a.remainder();
    let tail_b = chunks_b.remainder();

    let mut acc = f32x8::splat(0.0);
    for (x, y) in chunks_a.zip(chunks_b) {
        let diff = load(x) - load(y);
        acc = acc + diff * diff;
    }

    let mut sum: f32 = acc.to_array().iter().sum();
    for (x, y) in tail_a.iter().zip(tail_b) {
        let diff = x - y;
        sum += diff * diff;
    }
    sum
}

/// Euclidean (L2) distance between two equally sized vectors.
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt()
}

/// Per-dimension arithmetic mean of `points`.
///
/// Accumulates in `f64`. Returns an empty vector when `points` is empty.
pub fn centroid<'a, I>(points: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sums: Vec<f64> = Vec::new();
    let mut count = 0usize;

    for point in points {
        if sums.is_empty() {
            sums.resize(point.len(), 0.0);
        }
        for (sum, value) in sums.iter_mut().zip(point) {
            *sum += f64::from(*value);
        }
        count += 1;
    }

    if count == 0 {
        return Vec::new();
    }

    let n = count as f64;
    sums.into_iter().map(|sum| (sum / n) as f32).collect()
}
