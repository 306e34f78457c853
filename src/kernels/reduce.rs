//! Cooperative dot-product reduction shared by the parallel kernels
//!
//! A dot product of length K is computed by a group of `width` lanes:
//! lane `l` accumulates the terms `t = l, l + width, l + 2*width, ...`
//! and the lane partials are then folded by a fixed pairwise tree. For
//! very long vectors the K range is additionally bisected across pool
//! workers with `rayon::join`, which is the barrier before the two halves
//! are combined.
//!
//! Every split point depends only on K and the group configuration, so the
//! rounding is identical from call to call and between the CSR and COO
//! kernels. It is not the rounding of the sequential reference.

use crate::matrix::KernelParams;
use num_traits::Float;

/// Upper bound on lanes per group
pub const MAX_LANES: usize = 64;

/// Lane-group configuration for one dot product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneGroup {
    width: usize,
    cooperative_k_threshold: usize,
}

impl LaneGroup {
    /// Creates a group of `width` lanes (clamped to `1..=MAX_LANES`)
    pub fn new(width: usize, cooperative_k_threshold: usize) -> Self {
        Self {
            width: width.clamp(1, MAX_LANES),
            cooperative_k_threshold: cooperative_k_threshold.max(1),
        }
    }

    /// Group sized from the kernel parameters
    pub fn from_params(params: &KernelParams) -> Self {
        Self::new(params.group_width, params.cooperative_k_threshold)
    }

    /// Lanes in the group
    pub fn width(&self) -> usize {
        self.width
    }

    /// Dot product of two equal-length slices
    ///
    /// Must be called from inside a device launch when `a.len()` can reach
    /// the cooperative threshold, so the split runs on the device's workers.
    #[inline]
    pub fn dot<T: Float + Send + Sync>(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), b.len());
        if a.len() >= self.cooperative_k_threshold && a.len() >= 2 * self.width {
            self.split_dot(a, b)
        } else {
            lane_dot(a, b, self.width)
        }
    }

    fn split_dot<T: Float + Send + Sync>(&self, a: &[T], b: &[T]) -> T {
        // Keep the split on a lane boundary so every half starts at lane 0
        let mid = (a.len() / 2) / self.width * self.width;
        let (a_lo, a_hi) = a.split_at(mid);
        let (b_lo, b_hi) = b.split_at(mid);
        let (lo, hi) = rayon::join(|| self.dot(a_lo, b_lo), || self.dot(a_hi, b_hi));
        lo + hi
    }
}

impl Default for LaneGroup {
    fn default() -> Self {
        Self::from_params(&KernelParams::default())
    }
}

/// Strided per-lane accumulation followed by a pairwise tree fold
#[inline]
pub fn lane_dot<T: Float>(a: &[T], b: &[T], width: usize) -> T {
    let width = width.clamp(1, MAX_LANES).min(a.len().max(1));
    let mut partial = [T::zero(); MAX_LANES];

    for (xa, xb) in a.chunks(width).zip(b.chunks(width)) {
        for (lane, (&x, &y)) in xa.iter().zip(xb).enumerate() {
            partial[lane] = partial[lane] + x * y;
        }
    }

    tree_fold(&mut partial[..width])
}

/// Folds lane partials pairwise: lane `l` absorbs lane `l + ceil(n/2)` until one remains
#[inline]
pub fn tree_fold<T: Float>(partial: &mut [T]) -> T {
    let mut n = partial.len();
    if n == 0 {
        return T::zero();
    }
    while n > 1 {
        let half = (n + 1) / 2;
        for lane in 0..n / 2 {
            partial[lane] = partial[lane] + partial[lane + half];
        }
        n = half;
    }
    partial[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn tree_fold_odd_width() {
        let mut p = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(tree_fold(&mut p), 15.0);
        let mut single = [7.0f32];
        assert_eq!(tree_fold(&mut single), 7.0);
        let mut none: [f32; 0] = [];
        assert_eq!(tree_fold(&mut none), 0.0);
    }

    #[test]
    fn lane_dot_matches_sequential_on_integers() {
        // Small integers are exact in f64, so any order gives the same sum
        let a: Vec<f64> = (0..37).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..37).map(|i| (i % 5) as f64).collect();
        for width in [1, 2, 3, 8, 32, 64, 100] {
            assert_eq!(lane_dot(&a, &b, width), sequential(&a, &b));
        }
    }

    #[test]
    fn empty_and_scalar() {
        assert_eq!(lane_dot::<f32>(&[], &[], 32), 0.0);
        assert_eq!(lane_dot(&[3.0f32], &[4.0], 32), 12.0);
    }

    #[test]
    fn cooperative_split_agrees() {
        let a: Vec<f64> = (0..1000).map(|i| (i % 13) as f64).collect();
        let b: Vec<f64> = (0..1000).map(|i| (i % 7) as f64).collect();
        let group = LaneGroup::new(8, 64);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let split = pool.install(|| group.dot(&a, &b));
        assert_eq!(split, sequential(&a, &b));
    }

    #[test]
    fn dot_is_order_stable() {
        let a: Vec<f32> = (0..513).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..513).map(|i| (i as f32 * 0.11).cos()).collect();
        let group = LaneGroup::new(32, 128);
        let first = group.dot(&a, &b);
        for _ in 0..10 {
            assert_eq!(group.dot(&a, &b).to_bits(), first.to_bits());
        }
    }
}
