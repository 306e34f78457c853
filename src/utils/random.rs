//! Reproducible operand generation

use ndarray::Array2;
use num_traits::Float;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::utils::try_alloc;

/// Creates the deterministic generator used for every benchmark operand
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generates `n` uniform values in `[0, 1)`
///
/// # Errors
///
/// `AllocationFailure` if the buffer cannot be reserved.
pub fn random_values<T: Float>(n: usize, rng: &mut ChaCha8Rng) -> Result<Vec<T>> {
    let dist = Uniform::new(0.0f64, 1.0);
    let mut values = try_alloc(n, "random values")?;
    for v in values.iter_mut() {
        *v = T::from(dist.sample(rng)).unwrap_or_else(T::zero);
    }
    Ok(values)
}

/// Fills a `rows × cols` row-major matrix with uniform values in `[0, 1)`
///
/// # Errors
///
/// `AllocationFailure` if `rows * cols` elements cannot be reserved.
pub fn random_dense<T: Float>(rows: usize, cols: usize, rng: &mut ChaCha8Rng) -> Result<Array2<T>> {
    let len = rows.checked_mul(cols).ok_or(Error::AllocationFailure {
        what: "dense operand",
        bytes: usize::MAX,
    })?;
    let values = random_values(len, rng)?;
    Array2::from_shape_vec((rows, cols), values).map_err(|_| Error::DimensionMismatch {
        what: "dense operand",
        expected: len,
        got: len,
    })
}
